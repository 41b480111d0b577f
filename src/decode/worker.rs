use crate::decode::options::Options;
use crate::decode::stream::Decoded;
use crate::error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Decoder engine: synchronous decoding plus at most one background decode
/// in flight at a time.
#[derive(Debug, Default)]
pub struct Decompressor {
    options: Options,
    busy: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the background decode is done, even if the
/// decode or the callback panicked.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Decompressor {
    pub fn new(options: Options) -> Self {
        Decompressor {
            options,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether a background decode is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Decode a complete `.lzma` file (header and payload) held in memory.
    pub fn decode(&self, data: &[u8]) -> error::Result<Decoded> {
        crate::decode_with_options(data, &self.options)
    }

    /// Decode `data` on a background thread and hand the result to `callback`
    /// on that thread.
    ///
    /// Fails with [`Error::Busy`](crate::error::Error::Busy) while a
    /// previous request has not yet returned from its callback.
    pub fn decode_async<F>(
        &self,
        data: Vec<u8>,
        callback: F,
    ) -> error::Result<thread::JoinHandle<()>>
    where
        F: FnOnce(error::Result<Decoded>) + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            lzma_warn!("Background decode rejected, one is already in flight");
            return Err(error::Error::Busy);
        }

        let guard = InFlight(self.busy.clone());
        let options = self.options;
        thread::Builder::new()
            .name("lzma-decode".to_string())
            .spawn(move || {
                let _guard = guard;
                lzma_debug!("Background decode of {} bytes", data.len());
                callback(crate::decode_with_options(&data, &options));
            })
            .map_err(error::Error::IoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_guard_releases_flag() {
        let busy = Arc::new(AtomicBool::new(true));
        drop(InFlight(busy.clone()));
        assert!(!busy.load(Ordering::Acquire));
    }

    #[test]
    fn test_decode_async_error() {
        let decompressor = Decompressor::default();
        let (tx, rx) = mpsc::channel();
        let handle = decompressor
            .decode_async(vec![0x5d, 0x00], move |result| {
                tx.send(result.is_err()).unwrap();
            })
            .unwrap();
        handle.join().unwrap();
        assert!(rx.recv().unwrap());
        assert!(!decompressor.is_busy());
    }
}
