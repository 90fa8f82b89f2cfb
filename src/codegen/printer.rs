/// Line-oriented output buffer for generated Go source.
///
/// Indentation uses tabs, as gofmt would print it.
#[derive(Debug, Default, Clone)]
pub struct Printer {
    buf: String,
    indent: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line at the current indentation. Empty text gives an empty line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push('\t');
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Append another printer's text verbatim.
    pub fn append(&mut self, other: &Printer) {
        self.buf.push_str(&other.buf);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}
