#![allow(missing_docs)]

use flapevo::evolution::brain::Brain;
use flapevo::simulation::params::{Params, ScoringPolicy};
use flapevo::simulation::runner::{CandidateId, EpisodeBatchRunner, EvaluationConfig, Fitness};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn brains(ids: &[CandidateId], seed: u64) -> Vec<(CandidateId, Brain)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    ids.iter()
        .map(|&id| (id, Brain::new(&[4, 6, 1], 1.0, &mut rng)))
        .collect()
}

#[test]
fn fitness_follows_input_order() {
    let params = Params {
        gap_size: 2000.0,
        ..Params::default()
    };
    let config = EvaluationConfig {
        seed: 1,
        max_ticks: Some(200),
    };
    let runner = EpisodeBatchRunner::new(&params, &config).unwrap();

    let fitness = runner.evaluate(brains(&[10, 3, 7], 5), 1).unwrap();

    // Nobody can die on an open course, so the first candidate takes both
    // passes under the default scoring.
    assert_eq!(
        fitness,
        vec![
            Fitness {
                candidate: 10,
                score: 2
            },
            Fitness {
                candidate: 3,
                score: 0
            },
            Fitness {
                candidate: 7,
                score: 0
            },
        ]
    );
}

#[test]
fn max_ticks_cuts_off_survivors_with_their_score() {
    let params = Params {
        gap_size: 2000.0,
        scoring_policy: ScoringPolicy::EveryPasser,
        ..Params::default()
    };
    let config = EvaluationConfig {
        seed: 1,
        max_ticks: Some(130),
    };
    let runner = EpisodeBatchRunner::new(&params, &config).unwrap();

    let mut evaluation = runner.begin(brains(&[0, 1], 2), 9).unwrap();
    assert_eq!(evaluation.advance(100).unwrap(), None);
    let fitness = evaluation.advance(100).unwrap().unwrap();

    assert_eq!(evaluation.episode().tick(), 130);
    assert!(evaluation.episode().is_running());
    assert!(fitness.iter().all(|f| f.score == 1));
}

#[test]
fn same_seed_same_fitness() {
    let runner =
        EpisodeBatchRunner::new(&Params::default(), &EvaluationConfig::default()).unwrap();
    let ids: Vec<CandidateId> = (0..15).collect();

    let first = runner.evaluate(brains(&ids, 3), 77).unwrap();
    let second = runner.evaluate(brains(&ids, 3), 77).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_generation_has_no_fitness() {
    let runner =
        EpisodeBatchRunner::new(&Params::default(), &EvaluationConfig::default()).unwrap();
    let fitness = runner.evaluate(Vec::<(CandidateId, Brain)>::new(), 1).unwrap();
    assert!(fitness.is_empty());
}

#[test]
fn invalid_params_are_rejected_up_front() {
    let params = Params {
        track_height: -1.0,
        ..Params::default()
    };
    assert!(EpisodeBatchRunner::new(&params, &EvaluationConfig::default()).is_err());
}
