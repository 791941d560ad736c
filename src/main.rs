//! RustPressSymbol - Main entry point
//!
//! 1. Configure the button GPIO (input, pull, press edge) and UART1
//! 2. Spawn the press task: ISR subscription, debounce, select, emit
//! 3. Main thread becomes the log drain on the console UART

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod device {
    extern crate alloc;

    use alloc::boxed::Box;
    use core::convert::Infallible;
    use core::ffi::c_void;
    use core::num::NonZeroU32;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{AnyIOPin, IOPin, Input, InterruptType, PinDriver, Pull};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::task::notification::Notification;
    use esp_idf_svc::hal::uart::{self, UartDriver, UartTxDriver};
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::{self as esp_idf_sys, EspError};

    use rust_press_symbol::{
        capture::{CaptureOutcome, EdgeCapture},
        config::{CONFIG, TAG},
        diagnostics::LogSink,
        event::PinId,
        fault::FaultCode,
        hal::{
            esp::{EspClock, EspEventSource, EspLevelReader},
            ButtonPinConfig, MonotonicClock, SymbolUartConfig,
        },
        log_globals::{FAULT_STATE, LOG_STREAM},
        pipeline::PressPipeline,
        queue::EventQueue,
        selector::{mix_seed, XorShiftDraws},
        uart_logger::{uart_logger_task, UartLoggerConfig},
        Alphabet,
    };
    use rust_press_symbol::{rt_error, rt_info};

    /// Edge events, ISR → press task.
    static EVENT_QUEUE: EventQueue = EventQueue::new();

    /// Press task: above the log drain, below the ESP-IDF system tasks.
    const PRESS_TASK_PRIORITY: u32 = 10;
    const PRESS_TASK_STACK: u32 = 4096;

    type Pipeline = PressPipeline<
        'static,
        EspLevelReader,
        EspClock,
        FreeRtos,
        XorShiftDraws,
        UartDriver<'static>,
        LogSink<'static>,
    >;

    /// Everything the press task owns. Moved to the task as a Box.
    struct PressTask {
        pin: PinId,
        button: PinDriver<'static, AnyIOPin, Input>,
        pipeline: Pipeline,
    }

    impl PressTask {
        fn run(mut self) -> ! {
            // Notification binds to the calling task: create it here
            let notification = Notification::new();
            let notifier = notification.notifier();

            let capture = EdgeCapture::new(self.pin, &EVENT_QUEUE, EspLevelReader, EspClock)
                .with_fault_state(&FAULT_STATE);

            // SAFETY: The callback runs in ISR context and only touches the
            // lock-free queue, atomics and the task notifier.
            let subscribed = unsafe {
                self.button.subscribe(move || {
                    if capture.capture() == CaptureOutcome::Queued {
                        notifier.notify_and_yield(NonZeroU32::MIN);
                    }
                })
            };

            if let Err(err) = subscribed {
                FAULT_STATE.set(FaultCode::HardwareFault, 0);
                rt_error!(LOG_STREAM, EspClock.now_us(), "GPIO{} ISR subscribe failed: {:?}", self.pin.number(), err);
            }

            let mut source = EspEventSource::new(self.button, &EVENT_QUEUE, notification);
            self.pipeline.run(&mut source, &CONFIG)
        }
    }

    unsafe extern "C" fn press_task_entry(arg: *mut c_void) {
        // SAFETY: `arg` is the Box leaked by `spawn_press_task`, handed over exactly once
        let task = unsafe { Box::from_raw(arg as *mut PressTask) };
        task.run()
    }

    fn spawn_press_task(task: PressTask) -> Result<(), EspError> {
        let arg = Box::into_raw(Box::new(task)) as *mut c_void;

        // SAFETY: Entry point and argument stay valid for the task's lifetime
        let created = unsafe {
            esp_idf_sys::xTaskCreatePinnedToCore(
                Some(press_task_entry),
                c"press_task".as_ptr(),
                PRESS_TASK_STACK,
                arg,
                PRESS_TASK_PRIORITY,
                core::ptr::null_mut(),
                esp_idf_sys::tskNO_AFFINITY as _,
            )
        };

        if created != 1 {
            // SAFETY: Task was not created, reclaim the Box
            drop(unsafe { Box::from_raw(arg as *mut PressTask) });
            return Err(EspError::from_infallible::<{ esp_idf_sys::ESP_FAIL }>());
        }
        Ok(())
    }

    fn start() -> Result<Infallible, EspError> {
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;
        let clock = EspClock;

        // Console log UART first, so later failures can be reported
        let log_cfg = UartLoggerConfig::default();
        let mut log_uart = UartTxDriver::new(
            peripherals.uart0,
            pins.gpio43,
            Option::<AnyIOPin>::None, // CTS
            Option::<AnyIOPin>::None, // RTS
            &uart::config::Config::default().baudrate(Hertz(log_cfg.baud_rate)),
        )?;

        // Symbol UART: 8N1, no flow control
        let uart_cfg = SymbolUartConfig::default();
        let symbol_uart = UartDriver::new(
            peripherals.uart1,
            pins.gpio17,
            pins.gpio16,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart::config::Config::default()
                .baudrate(Hertz(uart_cfg.baud_rate))
                .rx_fifo_size(uart_cfg.buffer_size)
                .tx_fifo_size(uart_cfg.buffer_size),
        )?;

        let button_cfg = ButtonPinConfig::default();
        let mut button = PinDriver::input(pins.gpio0.downgrade())?;
        button.set_pull(if button_cfg.pull_up { Pull::Up } else { Pull::Down })?;
        button.set_interrupt_type(if button_cfg.press_edge_is_falling() {
            InterruptType::NegEdge
        } else {
            InterruptType::PosEdge
        })?;

        CONFIG.set_polarity(button_cfg.polarity);
        let config = CONFIG.snapshot();

        rt_info!(LOG_STREAM, clock.now_us(), "{}: {}", TAG, env!("VERSION_STRING"));
        rt_info!(
            LOG_STREAM,
            clock.now_us(),
            "{}: button GPIO{} {:?}, settle {}ms",
            TAG,
            button_cfg.pin.number(),
            config.polarity,
            config.settle_ms
        );
        rt_info!(
            LOG_STREAM,
            clock.now_us(),
            "{}: UART{} TX{} RX{} @ {} baud",
            TAG,
            uart_cfg.port,
            uart_cfg.tx_pin,
            uart_cfg.rx_pin,
            uart_cfg.baud_rate
        );

        let pipeline = PressPipeline::new(
            EspLevelReader,
            clock,
            FreeRtos,
            XorShiftDraws::new(mix_seed(clock.now_us(), clock.tick_count())),
            symbol_uart,
            Alphabet::UPPERCASE,
            &config,
        )
        .with_fault_state(&FAULT_STATE)
        .with_sink(LogSink::new(&LOG_STREAM));

        if let Err(err) = spawn_press_task(PressTask {
            pin: button_cfg.pin,
            button,
            pipeline,
        }) {
            rt_error!(LOG_STREAM, clock.now_us(), "{}: press task spawn failed: {:?}", TAG, err);
        }

        uart_logger_task(&mut log_uart, &EVENT_QUEUE)
    }

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        if start().is_err() {
            // No log UART to report through: park
            loop {
                FreeRtos::delay_ms(1000);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("emitter runs on ESP32-S3 only; build with --target xtensa-esp32s3-espidf");
}
