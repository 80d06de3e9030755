use std::io::{self, BufRead, Write};

use exam_core::model::{AnswerLetter, Question};

/// Line-oriented prompt over any reader and writer.
pub struct Terminal<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Prompt and lettered options, marking `selected` with `*`.
    pub fn show_question(
        &mut self,
        question: &Question,
        selected: Option<AnswerLetter>,
    ) -> io::Result<()> {
        writeln!(self.out, "{}", question.prompt())?;
        for letter in AnswerLetter::ALL {
            let marker = if selected == Some(letter) { '*' } else { ' ' };
            writeln!(self.out, " {marker}{letter}. {}", question.option(letter))?;
        }
        Ok(())
    }
}
