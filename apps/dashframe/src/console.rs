use std::collections::VecDeque;

use dashframe_proto::PrintPayload;

pub const DEFAULT_CONSOLE_LINES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub text: String,
    pub stderr: bool,
}

/// Most recent `print` output, oldest first. Survives `reload`.
#[derive(Debug)]
pub struct Console {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl Console {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, print: &PrintPayload) {
        // A print may carry several lines; keep each as its own row.
        for text in print.text.split('\n') {
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(ConsoleLine {
                text: text.to_string(),
                stderr: print.is_stderr(),
            });
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(DEFAULT_CONSOLE_LINES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn print(text: &str, stream: Option<&str>) -> PrintPayload {
        PrintPayload {
            text: text.into(),
            stream: stream.map(str::to_string),
            extra: Map::new(),
        }
    }

    #[test]
    fn oldest_lines_fall_off() {
        let mut console = Console::new(2);
        console.push(&print("one", None));
        console.push(&print("two", None));
        console.push(&print("three", Some("stderr")));

        let lines: Vec<_> = console.iter().map(|line| line.text.as_str()).collect();
        assert_eq!(lines, ["two", "three"]);
        assert!(console.iter().last().unwrap().stderr);
    }

    #[test]
    fn multi_line_prints_split_into_rows() {
        let mut console = Console::default();
        console.push(&print("a\nb", None));
        assert_eq!(console.len(), 2);
        assert_eq!(console.capacity(), DEFAULT_CONSOLE_LINES);
    }
}
