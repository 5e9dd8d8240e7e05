//! The I/O hub: 8 fixed channels, device 0 reserved for bank selection.

pub mod device;

use self::device::{ConsoleInput, ConsoleOutput, Device, LedDisplay, PaperTape, Switches};

/// Status snapshot for one occupied channel.
#[derive(Debug, Clone)]
pub struct DeviceStatus {
    pub name: String,
    pub flag: bool,
    pub enabled: bool,
}

/// The 8-channel I/O hub. Channel 0 is always empty here — `OUT 0` is
/// intercepted by the CPU for bank selection before it ever reaches the
/// hub, and `INP 0`/`SFG 0` read as 0/false since no device occupies it.
pub struct Hub {
    devices: [Option<Box<dyn Device>>; 8],
}

impl Default for Hub {
    fn default() -> Self {
        let mut hub = Hub {
            devices: [None, None, None, None, None, None, None, None],
        };
        hub.devices[1] = Some(Box::new(ConsoleInput::new()));
        hub.devices[2] = Some(Box::new(ConsoleOutput::new()));
        hub.devices[3] = Some(Box::new(Switches::new()));
        hub.devices[4] = Some(Box::new(LedDisplay::new()));
        hub.devices[5] = Some(Box::new(PaperTape::new()));
        hub
    }
}

impl Hub {
    pub fn new() -> Self {
        Hub::default()
    }

    /// Install a device on a channel (0..=7). Channel 0 is reserved and
    /// installing onto it is a no-op, matching the reference guard.
    pub fn install(&mut self, channel: u8, device: Box<dyn Device>) {
        if channel == 0 || channel > 7 {
            return;
        }
        self.devices[channel as usize] = Some(device);
    }

    pub fn remove(&mut self, channel: u8) {
        if (1..=7).contains(&channel) {
            self.devices[channel as usize] = None;
        }
    }

    /// `INP d`: data returned by the device on channel `d`, or 0 if the
    /// channel is empty/disabled/out of range.
    pub fn input(&mut self, channel: u8) -> u8 {
        match self.devices.get_mut(channel as usize) {
            Some(Some(dev)) if dev.enabled() => dev.input(),
            _ => 0,
        }
    }

    /// `OUT d`: forward data to the device on channel `d`. No-op if the
    /// channel is empty/disabled/out of range.
    pub fn output(&mut self, channel: u8, data: u8) {
        if let Some(Some(dev)) = self.devices.get_mut(channel as usize) {
            if dev.enabled() {
                dev.output(data);
            }
        }
    }

    /// `SFG d`: the device's ready flag, or false if empty/disabled.
    pub fn flag(&self, channel: u8) -> bool {
        match self.devices.get(channel as usize) {
            Some(Some(dev)) if dev.enabled() => dev.flag(),
            _ => false,
        }
    }

    pub fn reset_all(&mut self) {
        for dev in self.devices.iter_mut().flatten() {
            dev.reset();
        }
    }

    pub fn status(&self) -> Vec<Option<DeviceStatus>> {
        self.devices
            .iter()
            .map(|slot| {
                slot.as_ref().map(|dev| DeviceStatus {
                    name: dev.name().to_string(),
                    flag: dev.flag(),
                    enabled: dev.enabled(),
                })
            })
            .collect()
    }

    /// Convenience accessor for the console input device at its canonical
    /// channel, for test setup and CLI wiring. Panics if channel 1 was
    /// replaced with something other than a [`ConsoleInput`].
    pub fn console_input_mut(&mut self) -> &mut ConsoleInput {
        self.devices[1]
            .as_mut()
            .expect("channel 1 is the console input device by default")
            .as_any_mut()
            .downcast_mut::<ConsoleInput>()
            .expect("channel 1 holds a ConsoleInput")
    }

    /// Convenience accessor for the console output device at its canonical
    /// channel. Panics if channel 2 was replaced with something else.
    pub fn console_output_mut(&mut self) -> &mut ConsoleOutput {
        self.devices[2]
            .as_mut()
            .expect("channel 2 is the console output device by default")
            .as_any_mut()
            .downcast_mut::<ConsoleOutput>()
            .expect("channel 2 holds a ConsoleOutput")
    }

    /// Convenience accessor for the data-switches device at its canonical
    /// channel. Panics if channel 3 was replaced with something else.
    pub fn switches_mut(&mut self) -> &mut Switches {
        self.devices[3]
            .as_mut()
            .expect("channel 3 is the data switches device by default")
            .as_any_mut()
            .downcast_mut::<Switches>()
            .expect("channel 3 holds a Switches")
    }
}
