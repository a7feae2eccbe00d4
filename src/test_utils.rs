/*
 * Test utilities and fakes for Twinbeacon
 *
 * This module provides the journaling collaborator fakes and config fixtures
 * shared by the unit tests.
 */

#[cfg(test)]
pub mod test_utils {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;
    use std::time::Duration;

    use crate::config::{BeaconConfig, SensorSource};
    use crate::frame::AdvertisingFrame;
    use crate::rotation::{DigitalInput, Pacer, TransmitError, Transmitter};

    /// One observed interaction between the controller and its collaborators.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Step {
        Start(AdvertisingFrame),
        StartFailed(AdvertisingFrame),
        Stop,
        Dwell(Duration),
        Read(u8),
    }

    /// Shared ordered record of collaborator calls. All fakes attached to one
    /// journal interleave into it, so tests can assert exact call order.
    pub type Journal = Rc<RefCell<Vec<Step>>>;

    pub fn new_journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    /// Transmitter fake recording starts and stops; optionally fails every
    /// start while still recording the attempt.
    pub struct ScriptedTransmitter {
        journal: Journal,
        fail_starts: bool,
    }

    impl ScriptedTransmitter {
        pub fn new(journal: &Journal) -> Self {
            ScriptedTransmitter {
                journal: Rc::clone(journal),
                fail_starts: false,
            }
        }

        pub fn failing(journal: &Journal) -> Self {
            ScriptedTransmitter {
                journal: Rc::clone(journal),
                fail_starts: true,
            }
        }
    }

    impl Transmitter for ScriptedTransmitter {
        fn start_advertising(&mut self, frame: &AdvertisingFrame) -> Result<(), TransmitError> {
            if self.fail_starts {
                self.journal.borrow_mut().push(Step::StartFailed(*frame));
                return Err(TransmitError::Io(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "radio busy",
                )));
            }
            self.journal.borrow_mut().push(Step::Start(*frame));
            Ok(())
        }

        fn stop_advertising(&mut self) -> Result<(), TransmitError> {
            self.journal.borrow_mut().push(Step::Stop);
            Ok(())
        }
    }

    /// Pacer fake recording requested dwell windows without sleeping.
    pub struct RecordingPacer {
        journal: Journal,
    }

    impl RecordingPacer {
        pub fn new(journal: &Journal) -> Self {
            RecordingPacer {
                journal: Rc::clone(journal),
            }
        }
    }

    impl Pacer for RecordingPacer {
        fn dwell(&mut self, period: Duration) {
            self.journal.borrow_mut().push(Step::Dwell(period));
        }
    }

    /// Input fake replaying a scripted level sequence (the last level repeats
    /// once the script runs out), or failing every read.
    pub struct ScriptedInput {
        journal: Journal,
        levels: Vec<u8>,
        next: usize,
        fail: bool,
    }

    impl ScriptedInput {
        pub fn new(journal: &Journal, levels: Vec<u8>) -> Self {
            ScriptedInput {
                journal: Rc::clone(journal),
                levels,
                next: 0,
                fail: false,
            }
        }

        pub fn failing(journal: &Journal) -> Self {
            ScriptedInput {
                journal: Rc::clone(journal),
                levels: Vec::new(),
                next: 0,
                fail: true,
            }
        }
    }

    impl DigitalInput for ScriptedInput {
        fn read_level(&mut self) -> io::Result<u8> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::NotFound, "input line gone"));
            }
            let idx = self.next.min(self.levels.len().saturating_sub(1));
            let level = self.levels.get(idx).copied().unwrap_or(0);
            self.next += 1;
            self.journal.borrow_mut().push(Step::Read(level));
            Ok(level)
        }
    }

    /// Creates a BeaconConfig with test-friendly values.
    pub fn create_test_config() -> BeaconConfig {
        BeaconConfig {
            dwell_secs: 3,
            hci_dev: 0,
            adv_interval_ms: 100,
            sensor: SensorSource::Gpio { line: 17 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::config::validate_config;
    use crate::frame;
    use crate::rotation::{DigitalInput, Pacer, Transmitter};
    use std::time::Duration;

    #[test]
    fn test_journal_records_in_order() {
        let journal = new_journal();
        let mut tx = ScriptedTransmitter::new(&journal);
        let mut pacer = RecordingPacer::new(&journal);

        let frame = frame::normal_frame();
        tx.start_advertising(&frame).unwrap();
        pacer.dwell(Duration::from_secs(3));
        tx.stop_advertising().unwrap();

        let expected = vec![
            Step::Start(frame),
            Step::Dwell(Duration::from_secs(3)),
            Step::Stop,
        ];
        assert_eq!(*journal.borrow(), expected);
    }

    #[test]
    fn test_failing_transmitter_records_attempt() {
        let journal = new_journal();
        let mut tx = ScriptedTransmitter::failing(&journal);

        let frame = frame::normal_frame();
        assert!(tx.start_advertising(&frame).is_err());
        assert_eq!(*journal.borrow(), vec![Step::StartFailed(frame)]);
    }

    #[test]
    fn test_scripted_input_repeats_last_level() {
        let journal = new_journal();
        let mut input = ScriptedInput::new(&journal, vec![7]);

        assert_eq!(input.read_level().unwrap(), 7);
        assert_eq!(input.read_level().unwrap(), 7);
        assert_eq!(input.read_level().unwrap(), 7);
    }

    #[test]
    fn test_failing_input_errors_without_journal_entry() {
        let journal = new_journal();
        let mut input = ScriptedInput::failing(&journal);

        assert!(input.read_level().is_err());
        assert!(journal.borrow().is_empty());
    }

    #[test]
    fn test_create_test_config_is_valid() {
        assert!(validate_config(&create_test_config()).is_ok());
    }
}
