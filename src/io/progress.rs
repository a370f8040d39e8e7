use std::sync::{Mutex, OnceLock};

use crate::types::PollProgress;

type DownloadCb = Box<dyn Fn(u64, u64) + Send + 'static>;
type PollCb = Box<dyn Fn(&PollProgress) + Send + 'static>;

static DOWNLOAD_PROGRESS_CB: OnceLock<Mutex<Option<DownloadCb>>> = OnceLock::new();
static POLL_PROGRESS_CB: OnceLock<Mutex<Option<PollCb>>> = OnceLock::new();

pub fn set_download_progress_callback(cb: impl Fn(u64, u64) + Send + 'static) {
    let slot = DOWNLOAD_PROGRESS_CB.get_or_init(|| Mutex::new(None));
    if let Ok(mut g) = slot.lock() {
        *g = Some(Box::new(cb));
    }
}

pub fn emit_download_progress(done: u64, total: u64) {
    if let Some(m) = DOWNLOAD_PROGRESS_CB.get() {
        if let Ok(g) = m.lock() {
            if let Some(cb) = &*g {
                cb(done, total);
            }
        }
    }
}

/// Registers the status-changed observer called on every poll.
pub fn set_poll_progress_callback(cb: impl Fn(&PollProgress) + Send + 'static) {
    let slot = POLL_PROGRESS_CB.get_or_init(|| Mutex::new(None));
    if let Ok(mut g) = slot.lock() {
        *g = Some(Box::new(cb));
    }
}

pub fn clear_poll_progress_callback() {
    if let Some(m) = POLL_PROGRESS_CB.get() {
        if let Ok(mut g) = m.lock() {
            *g = None;
        }
    }
}

pub fn emit_poll_progress(progress: &PollProgress) {
    if let Some(m) = POLL_PROGRESS_CB.get() {
        if let Ok(g) = m.lock() {
            if let Some(cb) = &*g {
                cb(progress);
            }
        }
    }
}
