use std::io::{self, BufRead};

/// Iterates over newline-stripped, non-empty lines, stopping as soon as the
/// caller stops pulling. Bytes that are not valid UTF-8 are replaced with
/// U+FFFD.
pub struct NonEmptyLines<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> NonEmptyLines<R> {
    pub fn new(reader: R) -> Self {
        NonEmptyLines {
            reader,
            buffer: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for NonEmptyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err)),
            }

            let mut line = self.buffer.as_slice();
            if let Some(stripped) = line.strip_suffix(b"\n") {
                line = stripped.strip_suffix(b"\r").unwrap_or(stripped);
            }

            if !line.is_empty() {
                return Some(Ok(String::from_utf8_lossy(line).into_owned()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_empty_lines_and_strips_terminators() {
        let input = Cursor::new("one\r\n\n\ntwo\nthree");
        let lines: Vec<String> = NonEmptyLines::new(input).map(Result::unwrap).collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn decodes_invalid_utf8_lossily() {
        let input = Cursor::new(b"# Caf\xe9\n\nnext\n".to_vec());
        let lines: Vec<String> = NonEmptyLines::new(input).map(Result::unwrap).collect();
        assert_eq!(lines, vec!["# Caf\u{FFFD}", "next"]);
    }
}
