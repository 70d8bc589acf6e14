//! Spell cards and the ordered deck a boss works through
//!
//! A card is one named attack with its own health pool and duration. The
//! deck tracks which card is active and how long it has been running.

use serde::{Deserialize, Serialize};

use super::collision::Damageable;
use super::patterns::PatternId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellCard {
    pub name: String,
    pub pattern: PatternId,
    /// Soft time limit in ticks
    pub duration: u32,
    pub max_health: f32,
    /// Always within `[0, max_health]`
    pub current_health: f32,
}

impl SpellCard {
    pub fn new(
        name: impl Into<String>,
        pattern: PatternId,
        duration: u32,
        max_health: f32,
    ) -> Self {
        let max_health = max_health.max(0.0);
        Self {
            name: name.into(),
            pattern,
            duration,
            max_health,
            current_health: max_health,
        }
    }

    /// Card using the pattern's registered name, duration and health
    pub fn from_pattern(pattern: PatternId) -> Self {
        let spec = pattern.spec();
        Self::new(spec.title, pattern, spec.duration, spec.health)
    }

    pub fn reset(&mut self) {
        self.current_health = self.max_health;
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.current_health <= 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.current_health / self.max_health
        }
    }
}

impl Damageable for SpellCard {
    /// True only for the hit that empties the card
    fn apply_damage(&mut self, amount: f32) -> bool {
        if amount <= 0.0 || self.is_broken() {
            return false;
        }
        self.current_health = (self.current_health - amount).clamp(0.0, self.max_health);
        self.is_broken()
    }
}

/// Result of damaging the active card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardDamage {
    /// No card is active
    Empty,
    Absorbed,
    /// The card at `index` broke; `next` is the card now active, if any
    Broken { index: usize, next: Option<usize> },
}

/// Ordered cards with exactly one active until the deck is exhausted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDeck {
    cards: Vec<SpellCard>,
    active: usize,
    /// Ticks since the active card started
    elapsed: u32,
}

impl SpellDeck {
    pub fn new(cards: Vec<SpellCard>) -> Self {
        Self {
            cards,
            active: 0,
            elapsed: 0,
        }
    }

    pub fn cards(&self) -> &[SpellCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.active >= self.cards.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        (!self.is_exhausted()).then_some(self.active)
    }

    pub fn active_card(&self) -> Option<&SpellCard> {
        self.cards.get(self.active)
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    fn is_last(&self) -> bool {
        self.active + 1 >= self.cards.len()
    }

    /// Move to the next card, restoring its health. Returns the new index.
    fn advance(&mut self) -> Option<usize> {
        self.active = (self.active + 1).min(self.cards.len());
        self.elapsed = 0;
        let card = self.cards.get_mut(self.active)?;
        card.reset();
        Some(self.active)
    }

    /// Count one tick of the active card; returns the elapsed count
    pub fn step(&mut self) -> u32 {
        if !self.is_exhausted() {
            self.elapsed += 1;
        }
        self.elapsed
    }

    /// Apply the soft time limit. A card that outlasts its duration with
    /// health left hands off to the next one, unless it is the last card.
    /// Returns the newly active index on a hand-off.
    pub fn check_timeout(&mut self) -> Option<usize> {
        let card = self.active_card()?;
        if self.elapsed < card.duration {
            return None;
        }
        let survived = card.current_health > 0.0;
        self.elapsed = 0;
        if survived && !self.is_last() {
            self.advance()
        } else {
            None
        }
    }

    pub fn damage_active(&mut self, amount: f32) -> CardDamage {
        let index = self.active;
        let Some(card) = self.cards.get_mut(index) else {
            return CardDamage::Empty;
        };
        if card.apply_damage(amount) {
            let next = self.advance();
            CardDamage::Broken { index, next }
        } else {
            CardDamage::Absorbed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn deck(healths: &[f32], duration: u32) -> SpellDeck {
        SpellDeck::new(
            healths
                .iter()
                .map(|&h| SpellCard::new("test", PatternId::FairyDance, duration, h))
                .collect(),
        )
    }

    #[test]
    fn test_card_health_clamps_at_zero() {
        let mut card = SpellCard::new("Scattered Light", PatternId::LightBurst, 480, 150.0);
        assert!(!card.apply_damage(60.0));
        assert!(!card.apply_damage(60.0));
        assert!(card.apply_damage(60.0));
        assert_eq!(card.current_health, 0.0);
        assert!(!card.apply_damage(60.0));
    }

    #[test]
    fn test_overkill_advances_exactly_once() {
        let mut deck = deck(&[150.0, 200.0, 250.0], 600);
        assert_eq!(deck.damage_active(60.0), CardDamage::Absorbed);
        assert_eq!(deck.damage_active(60.0), CardDamage::Absorbed);
        assert_eq!(
            deck.damage_active(60.0),
            CardDamage::Broken {
                index: 0,
                next: Some(1)
            }
        );
        assert_eq!(deck.cards()[0].current_health, 0.0);
        assert_eq!(deck.active_index(), Some(1));
        assert_eq!(deck.active_card().map(|c| c.current_health), Some(200.0));
    }

    #[test]
    fn test_timeout_hands_off_without_breaking() {
        let mut deck = deck(&[100.0, 100.0], 3);
        deck.damage_active(10.0);
        for _ in 0..2 {
            deck.step();
            assert_eq!(deck.check_timeout(), None);
        }
        deck.step();
        assert_eq!(deck.check_timeout(), Some(1));
        assert_eq!(deck.elapsed(), 0);
        assert_eq!(deck.cards()[0].current_health, 90.0);
    }

    #[test]
    fn test_last_card_never_times_out() {
        let mut deck = deck(&[100.0], 2);
        for _ in 0..10 {
            deck.step();
            assert_eq!(deck.check_timeout(), None);
        }
        assert_eq!(deck.active_index(), Some(0));
        assert!(deck.elapsed() < 2);
    }

    #[test]
    fn test_breaking_last_card_exhausts_deck() {
        let mut deck = deck(&[10.0], 600);
        assert_eq!(deck.damage_active(25.0), CardDamage::Broken { index: 0, next: None });
        assert!(deck.is_exhausted());
        assert_eq!(deck.damage_active(1.0), CardDamage::Empty);
        assert_eq!(deck.check_timeout(), None);
    }

    #[test]
    fn test_empty_deck_is_harmless() {
        let mut deck = SpellDeck::new(Vec::new());
        assert!(deck.is_exhausted());
        assert_eq!(deck.step(), 0);
        assert_eq!(deck.damage_active(5.0), CardDamage::Empty);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Hit(f32),
        Tick,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0.0f32..120.0).prop_map(Op::Hit), Just(Op::Tick)]
    }

    proptest! {
        #[test]
        fn prop_card_health_stays_in_bounds(
            hits in proptest::collection::vec(-50.0f32..200.0, 0..30),
        ) {
            let mut card = SpellCard::new("test", PatternId::MagicStorm, 720, 200.0);
            for hit in hits {
                card.apply_damage(hit);
                prop_assert!(card.current_health >= 0.0);
                prop_assert!(card.current_health <= card.max_health);
            }
        }

        #[test]
        fn prop_one_active_card_until_exhausted(ops in proptest::collection::vec(op(), 0..200)) {
            let mut deck = deck(&[100.0, 150.0, 200.0], 20);
            for op in ops {
                match op {
                    Op::Hit(amount) => { deck.damage_active(amount); }
                    Op::Tick => { deck.step(); deck.check_timeout(); }
                }
                let active = deck.active_index();
                prop_assert_eq!(active.is_some(), !deck.is_exhausted());
                for card in deck.cards() {
                    prop_assert!(card.current_health >= 0.0);
                    prop_assert!(card.current_health <= card.max_health);
                }
            }
        }
    }
}
