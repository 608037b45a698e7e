use console::Term;

/// Single overwritten status line on stderr
///
/// Purely cosmetic. When the terminal size cannot be determined the update is dropped.
pub struct StatusLine {
    term: Term,
    enabled: bool,
}

impl StatusLine {
    pub fn stderr(enabled: bool) -> Self {
        Self {
            term: Term::stderr(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::stderr(false)
    }

    pub fn update(&self, message: &str) {
        if !self.enabled {
            return;
        }
        let Some((_rows, columns)) = self.term.size_checked() else {
            return;
        };
        if let Some(line) = fit_to_width(message, columns as usize) {
            let _ = self.term.write_str(&format!("{line}\r"));
        }
    }

    pub fn clear(&self) {
        self.update("");
    }
}

/// Pad or truncate `message` to one column short of `width`
pub fn fit_to_width(message: &str, width: usize) -> Option<String> {
    let usable = width.checked_sub(1)?;
    let mut line: String = message.chars().take(usable).collect();
    let len = line.chars().count();
    line.extend(std::iter::repeat_n(' ', usable - len));
    Some(line)
}
