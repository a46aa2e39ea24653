//! Generation of human-readable record codes.
//!
//! Date-prefixed codes take their suffix from a per-day store counter, so two registrations on
//! the same day can never be handed the same UHID even when they race.

use crate::clock::Clock;
use crate::HisResult;
use crate::store::Store;
use chrono::{FixedOffset, NaiveDate};
use his_ids::{CodeKind, DailyCode, SerialCode, TimestampCode};
use std::sync::Arc;

#[derive(Clone)]
pub struct CodeGenerator {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl CodeGenerator {
    /// `offset` decides which calendar day a daily code belongs to.
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            offset,
        }
    }

    /// Today's date in hospital local time.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.offset).date_naive()
    }

    pub async fn next_daily(&self, kind: CodeKind) -> HisResult<DailyCode> {
        let date = self.today();
        let seq = self
            .store
            .next_sequence(&DailyCode::counter_key(kind, date))
            .await?;
        Ok(DailyCode::new(kind, date, seq)?)
    }

    pub async fn next_serial(&self, kind: CodeKind) -> HisResult<SerialCode> {
        let seq = self.store.next_sequence(&SerialCode::counter_key(kind)).await?;
        Ok(SerialCode::new(kind, seq)?)
    }

    pub fn timestamped(&self, kind: CodeKind) -> HisResult<TimestampCode> {
        Ok(TimestampCode::new(kind, self.clock.now())?)
    }

    /// The next code of any kind, formatted.
    pub async fn next_code(&self, kind: CodeKind) -> HisResult<String> {
        if kind.is_daily() {
            Ok(self.next_daily(kind).await?.to_string())
        } else if kind.is_timestamped() {
            Ok(self.timestamped(kind)?.to_string())
        } else {
            Ok(self.next_serial(kind).await?.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn generator(clock: Arc<FixedClock>) -> CodeGenerator {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).expect("valid offset");
        CodeGenerator::new(Arc::new(MemoryStore::new()), clock, offset)
    }

    #[tokio::test]
    async fn test_uhid_suffix_increases_then_resets_next_day() {
        let start = Utc
            .with_ymd_and_hms(2026, 10, 16, 4, 0, 0)
            .single()
            .expect("valid timestamp");
        let clock = Arc::new(FixedClock::new(start));
        let codes = generator(Arc::clone(&clock));

        let first = codes.next_code(CodeKind::Uhid).await.expect("code");
        let second = codes.next_code(CodeKind::Uhid).await.expect("code");
        assert_eq!(first, "UHID202610160001");
        assert_eq!(second, "UHID202610160002");

        clock.advance(Duration::days(1));
        let next_day = codes.next_code(CodeKind::Uhid).await.expect("code");
        assert_eq!(next_day, "UHID202610170001");
    }

    #[tokio::test]
    async fn test_local_day_boundary_uses_offset() {
        // 19:00 UTC is already the next day at +05:30.
        let late = Utc
            .with_ymd_and_hms(2026, 10, 16, 19, 0, 0)
            .single()
            .expect("valid timestamp");
        let codes = generator(Arc::new(FixedClock::new(late)));
        let code = codes.next_code(CodeKind::Visit).await.expect("code");
        assert_eq!(code, "VISIT202610170001");
    }

    #[tokio::test]
    async fn test_kinds_use_separate_counters() {
        let now = Utc
            .with_ymd_and_hms(2026, 10, 16, 4, 0, 0)
            .single()
            .expect("valid timestamp");
        let codes = generator(Arc::new(FixedClock::new(now)));
        assert_eq!(codes.next_code(CodeKind::OpdBill).await.expect("code"), "OPD-00001");
        assert_eq!(codes.next_code(CodeKind::Accession).await.expect("code"), "LAB202610160001");
        assert_eq!(codes.next_code(CodeKind::OpdBill).await.expect("code"), "OPD-00002");
        assert_eq!(
            codes.next_code(CodeKind::Ipd).await.expect("code"),
            format!("IPD-{}", now.timestamp_millis())
        );
    }
}
