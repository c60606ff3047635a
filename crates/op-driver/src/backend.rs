//! Hardware capability the driver talks to.

use op_chip::Opn;

/// Register-level access to a sound chip.
pub trait HardwareBackend {
    /// Write a chip register.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a chip register.
    fn read(&mut self, addr: u16) -> u8;

    /// Read the status register.
    ///
    /// `loop_count` is the driver's completed-loop counter at the time of
    /// the query. Real chips ignore it.
    fn status(&mut self, loop_count: u32) -> u8;
}

impl HardwareBackend for Opn {
    fn write(&mut self, addr: u16, value: u8) {
        Opn::write(self, addr, value);
    }

    fn read(&mut self, addr: u16) -> u8 {
        Opn::read(self, addr)
    }

    fn status(&mut self, _loop_count: u32) -> u8 {
        Opn::status(self)
    }
}
