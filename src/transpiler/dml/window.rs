//! Window specification generation.

use crate::ast::{FrameBound, Window, WindowFrame};
use crate::error::QuarryResult;
use crate::transpiler::context::{AliasMode, Compiler};

impl Compiler<'_> {
    /// `(PARTITION BY .. ORDER BY .. ROWS BETWEEN .. AND ..)`
    pub(crate) fn window(&mut self, window: &Window) -> QuarryResult<()> {
        self.push('(');
        let mut needs_space = false;
        if !window.partition_by.is_empty() {
            self.push_str("PARTITION BY ");
            self.list(&window.partition_by, ", ", AliasMode::Inline)?;
            needs_space = true;
        }
        if !window.order_by.is_empty() {
            if needs_space {
                self.push(' ');
            }
            self.push_str("ORDER BY ");
            self.order_terms(&window.order_by)?;
            needs_space = true;
        }
        if let Some(frame) = &window.frame {
            if needs_space {
                self.push(' ');
            }
            let (kind, start, end) = match frame {
                WindowFrame::Rows { start, end } => ("ROWS", start, end),
                WindowFrame::Range { start, end } => ("RANGE", start, end),
            };
            self.push_str(&format!(
                "{} BETWEEN {} AND {}",
                kind,
                frame_bound(start),
                frame_bound(end)
            ));
        }
        self.push(')');
        Ok(())
    }
}

fn frame_bound(bound: &FrameBound) -> String {
    match bound {
        FrameBound::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
        FrameBound::Preceding(n) => format!("{} PRECEDING", n),
        FrameBound::CurrentRow => "CURRENT ROW".to_string(),
        FrameBound::Following(n) => format!("{} FOLLOWING", n),
        FrameBound::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
    }
}
