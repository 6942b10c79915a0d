//! Null emulation collaborator
//!
//! Stands in for the virtual machine until a real one is installed. It
//! keeps a single idle helper thread alive while "running" so teardown
//! exercises the same cancel-and-join path a real co-processor thread
//! would.

use crate::machine::{BootRequest, EmulationControl, MachineLinks};
use lr_core::{HelperThread, LoadError};
use std::thread;
use std::time::Duration;

/// Poll interval of the idle helper
const IDLE_POLL: Duration = Duration::from_millis(2);

#[derive(Default)]
pub struct NullMachine {
    links: Option<MachineLinks>,
    helper: Option<HelperThread>,
    boots: u32,
    resets: u32,
}

impl NullMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.helper.as_ref().is_some_and(|h| h.is_running())
    }

    pub fn boots(&self) -> u32 {
        self.boots
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }
}

impl EmulationControl for NullMachine {
    fn attach(&mut self, links: MachineLinks) {
        self.links = Some(links);
    }

    fn execute(&mut self, request: &BootRequest) -> Result<(), LoadError> {
        if self.links.is_none() {
            return Err(LoadError::Machine("not attached".to_string()));
        }
        self.cancel_helpers();

        let helper = HelperThread::spawn("vu1", |token| {
            while !token.is_cancelled() {
                thread::sleep(IDLE_POLL);
            }
        })
        .map_err(|e| LoadError::Machine(e.to_string()))?;

        tracing::info!("NullMachine: booting {:?} (BOOT2 injection: {})", request.mode, request.config.use_boot2_injection);
        self.helper = Some(helper);
        self.boots += 1;
        Ok(())
    }

    fn reset_quick(&mut self) {
        tracing::info!("NullMachine: quick reset");
        self.resets += 1;
    }

    fn shutdown(&mut self) {
        self.cancel_helpers();
    }

    fn cancel_helpers(&mut self) {
        if let Some(mut helper) = self.helper.take() {
            helper.cancel();
        }
    }

    fn cleanup_on_exit(&mut self) {
        self.cancel_helpers();
        self.links = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::BootMode;
    use lr_audio::SampleSink;
    use lr_core::{EmuConfig, PendingEvents};
    use lr_input::InputRelay;
    use std::sync::Arc;

    fn links() -> MachineLinks {
        MachineLinks {
            audio: Arc::new(SampleSink::default()),
            input: Arc::new(InputRelay::new()),
            events: Arc::new(PendingEvents::new()),
        }
    }

    fn request() -> BootRequest {
        BootRequest {
            mode: BootMode::NoDisc,
            media: None,
            config: EmuConfig::default(),
        }
    }

    #[test]
    fn test_execute_requires_attach() {
        let mut machine = NullMachine::new();
        assert!(machine.execute(&request()).is_err());
    }

    #[test]
    fn test_boot_and_cancel() {
        let mut machine = NullMachine::new();
        machine.attach(links());
        machine.execute(&request()).unwrap();
        assert!(machine.is_running());
        assert_eq!(machine.boots(), 1);

        machine.reset_quick();
        assert_eq!(machine.resets(), 1);
        assert!(machine.is_running());

        machine.shutdown();
        assert!(!machine.is_running());
        machine.cleanup_on_exit();
    }
}
