//! UART configuration for the symbol output channel.

/// Symbol output UART configuration (8N1, no flow control).
#[derive(Clone, Copy, Debug)]
pub struct SymbolUartConfig {
    pub port: u8,
    pub baud_rate: u32,
    pub tx_pin: u8,
    pub rx_pin: u8,
    /// Driver ring buffer size in bytes.
    pub buffer_size: usize,
}

impl Default for SymbolUartConfig {
    fn default() -> Self {
        Self {
            port: 1,
            baud_rate: 115200,
            tx_pin: 17,
            rx_pin: 16,
            buffer_size: 1024,
        }
    }
}
