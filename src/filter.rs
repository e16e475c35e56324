use std::collections::BTreeSet;

use log::debug;

use crate::models::{Difficulty, FilterConfig, Problem};
use crate::skill::DifficultyMapping;

/// Returns the eligible problems in their original order.
pub fn filter_problems(problems: &[Problem], config: &FilterConfig) -> Vec<Problem> {
    filter_with_mapping(problems, config, DifficultyMapping::Narrow)
}

pub fn filter_with_mapping(problems: &[Problem], config: &FilterConfig, mapping: DifficultyMapping) -> Vec<Problem> {
    let filtered: Vec<Problem> = problems
        .iter()
        .filter(|problem| is_eligible(problem, config, mapping))
        .cloned()
        .collect();
    debug!("Filtering {} problems resulted in {} problems", problems.len(), filtered.len());
    filtered
}

pub fn is_eligible(problem: &Problem, config: &FilterConfig, mapping: DifficultyMapping) -> bool {
    if config.hide_solved && problem.solved {
        return false;
    }
    if config.hide_premium && problem.premium {
        return false;
    }
    if !config.difficulties.is_empty() && !config.difficulties.contains(&problem.difficulty) {
        return false;
    }
    if !config.included_topics.is_empty() && problem.topics.is_disjoint(&config.included_topics) {
        return false;
    }
    if !config.excluded_topics.is_empty() && !problem.topics.is_disjoint(&config.excluded_topics) {
        return false;
    }
    if config.skill_based && !mapping.recommended(config.skill_level).contains(&problem.difficulty) {
        return false;
    }
    true
}

/// Difficulties that can pass both the difficulty gate and the skill gate.
pub fn effective_difficulties(config: &FilterConfig, mapping: DifficultyMapping) -> BTreeSet<Difficulty> {
    Difficulty::ALL
        .into_iter()
        .filter(|d| config.difficulties.is_empty() || config.difficulties.contains(d))
        .filter(|d| !config.skill_based || mapping.recommended(config.skill_level).contains(d))
        .collect()
}
