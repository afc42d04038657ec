use listwatch_core::{Record, Target};

use crate::error::NotifyError;

/// Most records included in a single alert; the rest are summarised as a count.
pub const MAX_ALERT_RECORDS: usize = 20;

/// A change alert for one target. Always holds at least one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub channel_id: String,
    pub display_name: String,
    pub category: String,
    pub url: String,
    /// At most [`MAX_ALERT_RECORDS`] records, in page order.
    pub records: Vec<Record>,
    /// Records left out of `records`.
    pub overflow: usize,
}

impl Alert {
    /// Builds an alert from the verified sample of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::EmptyAlert`] if `sample` is empty.
    pub fn new(target: &Target, sample: &[Record]) -> Result<Self, NotifyError> {
        if sample.is_empty() {
            return Err(NotifyError::EmptyAlert);
        }
        let shown = sample.len().min(MAX_ALERT_RECORDS);
        Ok(Self {
            channel_id: target.channel_id.clone(),
            display_name: target.display_name.clone(),
            category: target.category.clone(),
            url: target.url.clone(),
            records: sample[..shown].to_vec(),
            overflow: sample.len() - shown,
        })
    }

    #[must_use]
    pub fn title(&self) -> String {
        format!("New listing: {} ({})", self.display_name, self.category)
    }

    /// One line per record, plus a trailing overflow line when truncated.
    #[must_use]
    pub fn body(&self) -> String {
        let mut lines: Vec<String> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} — ¥{}", i + 1, r.name, format_price(r.price)))
            .collect();
        if self.overflow > 0 {
            lines.push(format!("…and {} more", self.overflow));
        }
        lines.join("\n")
    }
}

/// Formats `150000` as `"150,000"`.
#[must_use]
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
