use std::sync::atomic::{AtomicBool, Ordering};

use crate::sampler::gate::InterruptSource;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn signal_handler(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Release);
}

/// Route SIGINT and SIGTERM into the process-wide interruption flag.
pub fn install_signal_handlers() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = signal_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
    }
}

/// Interruption by a delivered SIGINT/SIGTERM.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalInterrupt;

impl InterruptSource for SignalInterrupt {
    fn is_interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::Acquire)
    }
}
