use rand::{seq::IndexedRandom, Rng};

use super::Solution;
use crate::{game::state::MIN_BAG_FOR_EXCHANGE, models::BotDifficulty};

/// Chance, in percent, that an easy bot passes its turn
const EASY_SKIP_PERCENT: u32 = 10;
/// Chance, in percent, that an easy bot exchanges letters instead of placing
const EASY_EXCHANGE_PERCENT: u32 = 10;
/// Score brackets an easy bot plays in, with the weight of each
const EASY_SCORE_BRACKETS: [(i32, i32, u32); 3] = [(0, 6, 40), (7, 12, 30), (13, 18, 30)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotMove {
    Place(Solution),
    Exchange(Vec<char>),
    Skip,
}

pub fn choose_move(
    difficulty: BotDifficulty,
    candidates: Vec<(Solution, i32)>,
    easel: &[char],
    bag_len: usize,
) -> BotMove {
    choose_move_with(&mut rand::rng(), difficulty, candidates, easel, bag_len)
}

pub fn choose_move_with<R: Rng>(
    rng: &mut R,
    difficulty: BotDifficulty,
    candidates: Vec<(Solution, i32)>,
    easel: &[char],
    bag_len: usize,
) -> BotMove {
    match difficulty {
        BotDifficulty::Easy => easy_move(rng, candidates, easel, bag_len),
        BotDifficulty::Hard => hard_move(candidates, easel, bag_len),
    }
}

fn easy_move<R: Rng>(
    rng: &mut R,
    candidates: Vec<(Solution, i32)>,
    easel: &[char],
    bag_len: usize,
) -> BotMove {
    let roll = rng.random_range(0..100);
    if roll < EASY_SKIP_PERCENT {
        return BotMove::Skip;
    }
    if roll < EASY_SKIP_PERCENT + EASY_EXCHANGE_PERCENT {
        return random_exchange(rng, easel, bag_len);
    }

    let total: u32 = EASY_SCORE_BRACKETS.iter().map(|(_, _, weight)| weight).sum();
    let mut pick = rng.random_range(0..total);
    let mut chosen = 0;
    for (idx, (_, _, weight)) in EASY_SCORE_BRACKETS.iter().enumerate() {
        if pick < *weight {
            chosen = idx;
            break;
        }
        pick -= weight;
    }

    // Nearest brackets first when the chosen one has nothing to offer
    let mut order: Vec<usize> = (0..EASY_SCORE_BRACKETS.len()).collect();
    order.sort_by_key(|&idx| idx.abs_diff(chosen));

    for idx in order {
        let (low, high, _) = EASY_SCORE_BRACKETS[idx];
        let pool: Vec<&(Solution, i32)> = candidates
            .iter()
            .filter(|(_, score)| (low..=high).contains(score))
            .collect();
        if let Some((solution, _)) = pool.choose(rng) {
            return BotMove::Place(solution.clone());
        }
    }

    BotMove::Skip
}

fn hard_move(candidates: Vec<(Solution, i32)>, easel: &[char], bag_len: usize) -> BotMove {
    if let Some((best, _)) = candidates.into_iter().max_by_key(|(_, score)| *score) {
        return BotMove::Place(best);
    }

    if bag_len >= MIN_BAG_FOR_EXCHANGE && !easel.is_empty() {
        let count = easel.len().min(bag_len);
        return BotMove::Exchange(easel[..count].to_vec());
    }

    BotMove::Skip
}

fn random_exchange<R: Rng>(rng: &mut R, easel: &[char], bag_len: usize) -> BotMove {
    if bag_len < MIN_BAG_FOR_EXCHANGE || easel.is_empty() {
        return BotMove::Skip;
    }

    let count = rng.random_range(1..=easel.len().min(bag_len));
    BotMove::Exchange(easel.choose_multiple(rng, count).copied().collect())
}
