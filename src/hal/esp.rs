//! ESP-IDF implementations of the HAL seams.
//!
//! Only built for `target_os = "espidf"`.

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver};
use esp_idf_svc::hal::task::notification::Notification;
use esp_idf_svc::hal::uart::{UartDriver, UartTxDriver};
use esp_idf_svc::sys::{self as esp_idf_sys, EspError};

use super::{ByteChannel, LevelReader, MonotonicClock};
use crate::event::{Level, PinId, RawEvent};
use crate::queue::{EventQueue, EventSource};

/// `esp_timer` microseconds plus the FreeRTOS tick counter.
#[derive(Clone, Copy, Default)]
pub struct EspClock;

impl MonotonicClock for EspClock {
    #[inline]
    fn now_us(&self) -> i64 {
        // SAFETY: esp_timer_get_time is always safe to call, ISR included
        unsafe { esp_idf_sys::esp_timer_get_time() }
    }

    #[inline]
    fn tick_count(&self) -> u32 {
        // SAFETY: Read-only scheduler query
        unsafe { esp_idf_sys::xTaskGetTickCount() }
    }
}

/// Raw register level read, usable from the edge ISR.
#[derive(Clone, Copy, Default)]
pub struct EspLevelReader;

impl LevelReader for EspLevelReader {
    #[inline]
    fn read_level(&self, pin: PinId) -> Level {
        // SAFETY: gpio_get_level only reads the input register
        Level::from_raw(unsafe { esp_idf_sys::gpio_get_level(pin.number() as i32) })
    }
}

impl<'d> ByteChannel for UartDriver<'d> {
    type Error = EspError;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, EspError> {
        UartDriver::write(self, bytes)
    }
}

impl<'d> ByteChannel for UartTxDriver<'d> {
    type Error = EspError;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, EspError> {
        UartTxDriver::write(self, bytes)
    }
}

/// Blocking event source for the press task.
///
/// esp-idf-hal disarms the pin interrupt each time it fires, so the
/// source re-arms it before every receive. The ISR wakes the task via
/// a FreeRTOS task notification.
pub struct EspEventSource<'d, 'q> {
    button: PinDriver<'d, AnyIOPin, Input>,
    queue: &'q EventQueue,
    notification: Notification,
    rearm_failures: u32,
}

impl<'d, 'q> EspEventSource<'d, 'q> {
    /// `notification` must be created on the task that will call
    /// `receive_blocking`.
    pub fn new(button: PinDriver<'d, AnyIOPin, Input>, queue: &'q EventQueue, notification: Notification) -> Self {
        Self {
            button,
            queue,
            notification,
            rearm_failures: 0,
        }
    }

    pub fn rearm_failures(&self) -> u32 {
        self.rearm_failures
    }

    fn rearm(&mut self) {
        if self.button.enable_interrupt().is_err() {
            self.rearm_failures = self.rearm_failures.wrapping_add(1);
            crate::log_globals::FAULT_STATE
                .set(crate::fault::FaultCode::HardwareFault, self.rearm_failures);
        }
    }
}

impl<'d, 'q> EventSource for EspEventSource<'d, 'q> {
    fn receive_blocking(&mut self) -> RawEvent {
        loop {
            self.rearm();
            if let Some(event) = self.queue.try_pop() {
                return event;
            }
            self.notification.wait(BLOCK);
        }
    }
}
