use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;

/// Line editor for the interactive session. History is loaded on creation and saved on drop
/// when a history file was given.
pub struct LineReader {
    rl: Editor<(), FileHistory>,
    history_file: Option<String>,
}

impl Drop for LineReader {
    fn drop(&mut self) {
        if let Some(ref history_file) = self.history_file {
            self.rl.save_history(history_file).ok();
        }
    }
}

pub enum LineReadStatus {
    Line(String),
    Done,
}

impl LineReader {
    pub fn new(history_file: Option<&str>) -> Result<LineReader, ReadlineError> {
        let mut rl = Editor::<(), FileHistory>::new()?;
        if let Some(history_file) = history_file {
            rl.load_history(history_file).ok();
        }
        Ok(LineReader {
            rl,
            history_file: history_file.map(Into::into),
        })
    }

    pub fn readline(&mut self, prompt: &str) -> Result<LineReadStatus, ReadlineError> {
        match self.rl.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.rl.add_history_entry(line.as_str()).ok();
                }
                Ok(LineReadStatus::Line(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(LineReadStatus::Done),
            Err(e) => Err(e),
        }
    }
}
