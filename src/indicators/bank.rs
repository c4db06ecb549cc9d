use crate::data::Bar;
use crate::error::{BacktestError, Result};
use crate::indicators::{CrossOver, Indicator, IndicatorKind};
use indexmap::IndexMap;

enum Slot {
    Series(Box<dyn Indicator>),
    Cross {
        a: IndicatorKind,
        b: IndicatorKind,
        detector: CrossOver,
    },
}

impl Slot {
    fn value(&self) -> Option<f64> {
        match self {
            Slot::Series(ind) => ind.value(),
            Slot::Cross { detector, .. } => detector.value(),
        }
    }
}

//the set of indicators a run needs, keyed by kind and updated once per bar
//owned by the engine; strategies only ever see it through a shared reference
#[derive(Default)]
pub struct IndicatorBank {
    slots: IndexMap<IndicatorKind, Slot>,
    bars_seen: usize,
}

impl IndicatorBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kinds<I>(kinds: I) -> Result<Self>
    where
        I: IntoIterator<Item = IndicatorKind>,
    {
        let mut bank = IndicatorBank::new();
        for kind in kinds {
            bank.register(kind)?;
        }
        Ok(bank)
    }

    //registers an indicator (and a crossover's inputs) if not already present
    pub fn register(&mut self, kind: IndicatorKind) -> Result<()> {
        if self.slots.contains_key(&kind) {
            return Ok(());
        }
        if self.bars_seen > 0 {
            return Err(BacktestError::config(format!(
                "cannot register {} after {} bars have been consumed",
                kind, self.bars_seen
            )));
        }

        let slot = match &kind {
            IndicatorKind::CrossOver(a, b) => {
                if matches!(**a, IndicatorKind::CrossOver(..))
                    || matches!(**b, IndicatorKind::CrossOver(..))
                {
                    return Err(BacktestError::config(format!(
                        "{}: crossover inputs must be price indicators",
                        kind
                    )));
                }
                self.register((**a).clone())?;
                self.register((**b).clone())?;
                Slot::Cross {
                    a: (**a).clone(),
                    b: (**b).clone(),
                    detector: CrossOver::new(),
                }
            }
            other => Slot::Series(other.build()?),
        };

        self.slots.insert(kind, slot);
        Ok(())
    }

    //advances every indicator by one bar
    pub fn update(&mut self, bar: &Bar) {
        for slot in self.slots.values_mut() {
            if let Slot::Series(ind) = slot {
                ind.update(bar);
            }
        }

        //crossovers read inputs that were all refreshed above
        for i in 0..self.slots.len() {
            let inputs = match &self.slots[i] {
                Slot::Cross { a, b, .. } => Some((self.get(a), self.get(b))),
                Slot::Series(_) => None,
            };
            if let (Some((va, vb)), Slot::Cross { detector, .. }) = (inputs, &mut self.slots[i]) {
                detector.update(va, vb);
            }
        }

        self.bars_seen += 1;
    }

    //current value, None during warm-up or if the kind was never registered
    pub fn get(&self, kind: &IndicatorKind) -> Option<f64> {
        self.slots.get(kind).and_then(Slot::value)
    }

    //true once every registered indicator has a value at the current bar
    pub fn is_ready(&self) -> bool {
        self.slots.values().all(|slot| slot.value().is_some())
    }

    //index of the first bar at which every registered indicator is defined
    pub fn warmup(&self) -> usize {
        self.slots.keys().map(IndicatorKind::warmup).max().unwrap_or(0)
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn kinds(&self) -> impl Iterator<Item = &IndicatorKind> {
        self.slots.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::bars_from_closes;

    #[test]
    fn crossover_registers_inputs_first() {
        let cross = IndicatorKind::crossover(IndicatorKind::Sma(2), IndicatorKind::Sma(3));
        let bank = IndicatorBank::with_kinds([cross.clone()]).unwrap();

        let kinds: Vec<_> = bank.kinds().cloned().collect();
        assert_eq!(kinds, vec![IndicatorKind::Sma(2), IndicatorKind::Sma(3), cross]);
        assert_eq!(bank.warmup(), 3);
    }

    #[test]
    fn duplicate_kinds_share_one_slot() {
        let bank = IndicatorBank::with_kinds([
            IndicatorKind::Sma(50),
            IndicatorKind::Sma(50),
            IndicatorKind::Rsi(14),
        ])
        .unwrap();
        assert_eq!(bank.kinds().count(), 2);
    }

    #[test]
    fn ready_at_warmup_and_values_follow_bars() {
        let cross = IndicatorKind::crossover(IndicatorKind::Sma(1), IndicatorKind::Sma(3));
        let mut bank = IndicatorBank::with_kinds([cross.clone()]).unwrap();

        //dip then rally: the 1-bar average crosses the 3-bar average upwards at index 4
        let bars = bars_from_closes(&[10.0, 9.0, 8.0, 7.0, 12.0, 13.0]);
        let mut first_ready = None;
        let mut signals = Vec::new();

        for (i, bar) in bars.iter().enumerate() {
            bank.update(bar);
            if bank.is_ready() && first_ready.is_none() {
                first_ready = Some(i);
            }
            signals.push(bank.get(&cross));
        }

        assert_eq!(first_ready, Some(bank.warmup()));
        assert_eq!(signals[4], Some(1.0));
        assert_eq!(signals[5], Some(0.0));
        assert_eq!(bank.get(&IndicatorKind::Sma(1)), Some(13.0));
        assert_eq!(bank.bars_seen(), 6);
    }

    #[test]
    fn unknown_kind_reads_as_undefined() {
        let bank = IndicatorBank::with_kinds([IndicatorKind::Sma(2)]).unwrap();
        assert_eq!(bank.get(&IndicatorKind::Atr(14)), None);
    }

    #[test]
    fn late_registration_is_rejected() {
        let mut bank = IndicatorBank::with_kinds([IndicatorKind::Sma(2)]).unwrap();
        bank.update(&bars_from_closes(&[1.0])[0]);
        assert!(bank.register(IndicatorKind::Rsi(3)).is_err());
    }

    #[test]
    fn nested_crossover_is_rejected() {
        let inner = IndicatorKind::crossover(IndicatorKind::Sma(1), IndicatorKind::Sma(2));
        let outer = IndicatorKind::crossover(inner, IndicatorKind::Sma(3));
        assert!(IndicatorBank::with_kinds([outer]).is_err());
    }
}
