use crate::segmentation::MaskImage;
use std::sync::Arc;
use tokio::sync::watch;

/// Latest published mask
///
/// One writer (the segmentation tick), any number of readers. Publishing
/// swaps the whole `Arc`, so a reader sees either the old mask or the new one.
#[derive(Debug)]
pub struct MaskSlot {
    tx: watch::Sender<Option<Arc<MaskImage>>>,
}

impl Default for MaskSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskSlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current mask
    pub fn publish(&self, mask: MaskImage) -> Arc<MaskImage> {
        let mask = Arc::new(mask);
        self.tx.send_replace(Some(Arc::clone(&mask)));
        mask
    }

    /// Withdraw the current mask, e.g. after the compute grid changed
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn latest(&self) -> Option<Arc<MaskImage>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<MaskImage>>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn readers_see_whole_replacements() {
        let slot = MaskSlot::new();
        let mut rx = slot.subscribe();
        assert!(slot.latest().is_none());

        let first = slot.publish(MaskImage::from_alpha(&Array2::zeros((2, 2))));
        let second = slot.publish(MaskImage::from_alpha(&Array2::ones((3, 3))));

        // Only the newest value is observable
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone().unwrap();
        assert!(Arc::ptr_eq(&seen, &second));
        assert!(!Arc::ptr_eq(&seen, &first));

        slot.clear();
        assert!(slot.latest().is_none());
    }
}
