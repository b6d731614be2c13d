use super::types::Distribution;
use crate::types::*;

/// Rank of a validator within the emitted set. Equal scores share a slice.
pub type Score = (u64, i64);

/// Hands out voting powers by seat rank, following a [`Distribution`].
///
/// Seats are fed in emission order. A slice owns `part` of the `max_validators` seats, rounded
/// down; the generator moves to the next slice only once the seat position exceeds the
/// accumulated parts and the score differs from the previous seat. Seats beyond
/// `max_validators` get the luckies power.
pub struct VpGenerator<'a> {
    distribution: &'a Distribution,
    max_validators: u64,
    count: u64,
    ptr: usize,
    part_accum: Fraction,
    last_score: Option<Score>,
}

impl<'a> VpGenerator<'a> {
    pub fn new(distribution: &'a Distribution, max_validators: u64) -> Self {
        Self {
            distribution,
            max_validators,
            count: 0,
            ptr: 0,
            part_accum: Fraction::ZERO,
            last_score: None,
        }
    }

    pub fn next_power(&mut self, score: Score) -> i64 {
        self.count += 1;
        let slices = &self.distribution.slices;
        if self.count > self.max_validators || slices.is_empty() {
            return self.distribution.luckies_voting_power;
        }

        if self.count == 1 {
            self.part_accum = slices[0].part;
        } else {
            let seat = i64::try_from(self.count).unwrap_or(i64::MAX);
            let seats = i64::try_from(self.max_validators).unwrap_or(i64::MAX);
            let position = Fraction::new(seat, seats);
            let tie = self.last_score == Some(score);
            if position > self.part_accum && !tie && self.ptr + 1 < slices.len() {
                self.ptr += 1;
                self.part_accum = self.part_accum + slices[self.ptr].part;
            }
        }
        self.last_score = Some(score);
        slices[self.ptr].voting_power
    }
}
