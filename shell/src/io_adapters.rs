use std::cell::RefCell;
use std::io::{Read, Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// Input that is already at end of stream.
///
/// Bound to a stage whose upstream pipe was never created because the
/// producing stage could not be launched.
pub struct ClosedInput;

impl Read for ClosedInput {
    fn read(&mut self, _out: &mut [u8]) -> IoResult<usize> {
        Ok(0)
    }
}

impl crate::command::Stdin for ClosedInput {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

/// Memory-backed writer, used to capture diagnostics.
#[derive(Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
