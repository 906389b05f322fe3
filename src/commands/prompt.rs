//! 终端交互：读取输入与确认

use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// 输入输出对，测试中用内存缓冲替代
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// 打印提示并读取一行，输入结束（EOF）时返回 None
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// 只有输入 y（不区分大小写）才算确认
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{} (y/n): ", question))?;
        Ok(matches!(answer, Some(a) if a.eq_ignore_ascii_case("y")))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R, W: Write> Write for Console<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[test]
    fn test_confirm_requires_y() {
        let mut c = console("y\nyes\nY\n\n");
        assert!(c.confirm("继续?").unwrap());
        assert!(!c.confirm("继续?").unwrap());
        assert!(c.confirm("继续?").unwrap());
        assert!(!c.confirm("继续?").unwrap());
        // EOF 视为拒绝
        assert!(!c.confirm("继续?").unwrap());
        assert!(output(c).contains("继续? (y/n): "));
    }

    #[test]
    fn test_ask_trims_and_detects_eof() {
        let mut c = console("  2  \n");
        assert_eq!(c.ask("> ").unwrap().as_deref(), Some("2"));
        assert_eq!(c.ask("> ").unwrap(), None);
    }
}
