//! Receipts read from uploaded pictures, waiting to be confirmed one by one.

use std::collections::VecDeque;

use api_types::receipt::Receipt;

#[derive(Debug, Default)]
pub struct ReceiptQueue {
    pending: VecDeque<Receipt>,
}

impl ReceiptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, receipts: impl IntoIterator<Item = Receipt>) {
        self.pending.extend(receipts);
    }

    pub fn shift(&mut self) -> Option<Receipt> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Receipt> {
        self.pending.iter()
    }

    /// Once a receipt from a store is saved with a category and a remark,
    /// every other pending receipt from the same store takes them too.
    ///
    /// Returns how many receipts were updated.
    pub fn share_store(&mut self, registration: &str, category: &str, remark: &str) -> usize {
        if registration.is_empty() {
            return 0;
        }
        let mut updated = 0;
        for receipt in self
            .pending
            .iter_mut()
            .filter(|r| r.registration.as_deref() == Some(registration))
        {
            receipt.category = Some(category.to_string());
            receipt.remark = Some(remark.to_string());
            updated += 1;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(amount: i64, registration: Option<&str>) -> Receipt {
        Receipt {
            amount: Some(amount),
            registration: registration.map(str::to_string),
            ..Receipt::default()
        }
    }

    #[test]
    fn shift_is_first_in_first_out() {
        let mut queue = ReceiptQueue::new();
        queue.extend([receipt(1, None), receipt(2, None)]);
        queue.extend([receipt(3, None)]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.shift().and_then(|r| r.amount), Some(1));
        assert_eq!(queue.shift().and_then(|r| r.amount), Some(2));
        assert_eq!(queue.shift().and_then(|r| r.amount), Some(3));
        assert!(queue.shift().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn share_store_only_touches_same_registration() {
        let mut queue = ReceiptQueue::new();
        queue.extend([
            receipt(100, Some("T1111111111111")),
            receipt(200, Some("T2222222222222")),
            receipt(300, Some("T1111111111111")),
            receipt(400, None),
        ]);

        let updated = queue.share_store("T1111111111111", "外食", "ラーメン屋");
        assert_eq!(updated, 2);

        let remarks: Vec<_> = queue.iter().map(|r| r.remark.as_deref()).collect();
        assert_eq!(remarks, vec![Some("ラーメン屋"), None, Some("ラーメン屋"), None]);
        assert_eq!(queue.iter().nth(2).and_then(|r| r.category.as_deref()), Some("外食"));
    }

    #[test]
    fn share_store_ignores_empty_registration() {
        let mut queue = ReceiptQueue::new();
        queue.extend([receipt(400, None)]);
        assert_eq!(queue.share_store("", "日常", "x"), 0);
        assert!(queue.iter().all(|r| r.remark.is_none()));
    }
}
