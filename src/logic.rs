/*
Dismissal task generation and verification.
Module is independent of any screen / storage code so it can be tested alone
*/

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::TaskError;
use crate::models::{TaskDifficulty, TaskType};

const OPTION_COUNT: usize = 4;
const OPTION_OFFSET: i64 = 5;
const MAX_OPTION_DRAWS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    // division is rounded to 2 decimals; the divisor is never 0
    pub fn apply(self, lhs: i64, rhs: i64) -> f64 {
        match self {
            Operator::Add => (lhs + rhs) as f64,
            Operator::Subtract => (lhs - rhs) as f64,
            Operator::Multiply => (lhs * rhs) as f64,
            Operator::Divide => round2(lhs as f64 / rhs as f64),
        }
    }
}

// Multiple-choice arithmetic question
#[derive(Debug, Clone, PartialEq)]
pub struct MathProblem {
    pub question: String, // "<num1> <op> <num2>"
    pub answer: f64,
    pub options: Vec<f64>, // 4 distinct values, answer included, shuffled
}

// Text to copy with a minimum accuracy
#[derive(Debug, Clone, PartialEq)]
pub struct TypingChallenge {
    pub text: String,
    pub min_accuracy: f64, // percent, 0..100
}

// A dismissal task, fixed for the lifetime of one dismissal session.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Math(MathProblem),
    Typing(TypingChallenge),
}

impl Task {
    pub fn task_type(&self) -> TaskType {
        match self {
            Task::Math(_) => TaskType::Math,
            Task::Typing(_) => TaskType::Typing,
        }
    }

    // What the user is asked to answer or reproduce.
    pub fn prompt(&self) -> &str {
        match self {
            Task::Math(problem) => &problem.question,
            Task::Typing(challenge) => &challenge.text,
        }
    }
}

// Outcome of checking one submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verification {
    pub is_correct: bool,
    pub accuracy: Option<f64>, // only for typing tasks
}

// Generate a task using the thread-local RNG.
pub fn generate_task(task_type: TaskType, difficulty: TaskDifficulty) -> Result<Task, TaskError> {
    generate_task_with(&mut rand::thread_rng(), task_type, difficulty)
}

pub fn generate_task_with<R: Rng + ?Sized>(
    rng: &mut R,
    task_type: TaskType,
    difficulty: TaskDifficulty,
) -> Result<Task, TaskError> {
    debug!(%task_type, %difficulty, "generating dismissal task");
    match task_type {
        TaskType::Math => Ok(Task::Math(generate_math_problem(rng, difficulty))),
        TaskType::Typing => Ok(Task::Typing(generate_typing_challenge(difficulty))),
        TaskType::Puzzle => Err(TaskError::UnsupportedTaskType(task_type)),
    }
}

// Operand ranges / operators by tier:
//     easy   -> [0,10),  +
//     medium -> [0,50),  + - *
//     hard   -> [0,100), + - * /
pub fn generate_math_problem<R: Rng + ?Sized>(rng: &mut R, difficulty: TaskDifficulty) -> MathProblem {
    let (limit, operators): (i64, &[Operator]) = match difficulty {
        TaskDifficulty::Easy => (10, &[Operator::Add]),
        TaskDifficulty::Medium => (50, &[Operator::Add, Operator::Subtract, Operator::Multiply]),
        TaskDifficulty::Hard => (
            100,
            &[Operator::Add, Operator::Subtract, Operator::Multiply, Operator::Divide],
        ),
    };

    let lhs = rng.gen_range(0..limit);
    let operator = *operators.choose(rng).unwrap_or(&Operator::Add);
    let rhs = if operator == Operator::Divide {
        rng.gen_range(1..limit)
    } else {
        rng.gen_range(0..limit)
    };

    let answer = operator.apply(lhs, rhs);
    MathProblem {
        question: format!("{lhs} {} {rhs}", operator.symbol()),
        answer,
        options: generate_options(rng, answer),
    }
}

pub fn generate_typing_challenge(difficulty: TaskDifficulty) -> TypingChallenge {
    let (text, min_accuracy) = match difficulty {
        TaskDifficulty::Easy => ("The quick brown fox jumps over the lazy dog", 80.0),
        TaskDifficulty::Medium => (
            "Pack my box with five dozen liquor jugs! How vexingly quick daft zebras jump.",
            90.0,
        ),
        TaskDifficulty::Hard => (
            "The five boxing wizards jump quickly! Pack my red box with five dozen quality jugs.",
            95.0,
        ),
    };
    TypingChallenge {
        text: text.to_string(),
        min_accuracy,
    }
}

// Answer plus three distractors at integer offsets in [-5,5].
// Sampling is capped; any shortfall is filled with the nearest free offsets.
fn generate_options<R: Rng + ?Sized>(rng: &mut R, answer: f64) -> Vec<f64> {
    let mut options = vec![answer];

    let mut draws = 0;
    while options.len() < OPTION_COUNT && draws < MAX_OPTION_DRAWS {
        draws += 1;
        let offset = rng.gen_range(-OPTION_OFFSET..=OPTION_OFFSET);
        push_distinct(&mut options, round2(answer + offset as f64));
    }

    let mut step = 1.0;
    while options.len() < OPTION_COUNT {
        push_distinct(&mut options, round2(answer + step));
        push_distinct(&mut options, round2(answer - step));
        step += 1.0;
    }

    options.shuffle(rng);
    options
}

fn push_distinct(options: &mut Vec<f64>, candidate: f64) {
    if options.len() < OPTION_COUNT && !options.contains(&candidate) {
        options.push(candidate);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Percentage of positions where `input` and `target` hold the same character.
//
// Positions are compared as-is (no alignment), over the longer of the two
// strings, so a single insertion shifts everything after it.
pub fn typing_accuracy(input: &str, target: &str) -> f64 {
    let input: Vec<char> = input.chars().collect();
    let target: Vec<char> = target.chars().collect();
    let max_len = input.len().max(target.len());
    if max_len == 0 {
        return 100.0;
    }

    let matching = input
        .iter()
        .zip(target.iter())
        .filter(|(a, b)| a == b)
        .count();

    matching as f64 / max_len as f64 * 100.0
}

// Check one submission. Math answers must equal the stored answer exactly;
// typing answers must reach the challenge's accuracy threshold.
pub fn verify_submission(task: &Task, input: &str) -> Verification {
    match task {
        Task::Math(problem) => {
            let is_correct = input
                .trim()
                .parse::<f64>()
                .is_ok_and(|value| value == problem.answer);
            Verification { is_correct, accuracy: None }
        }
        Task::Typing(challenge) => {
            let accuracy = typing_accuracy(input, &challenge.text);
            Verification {
                is_correct: accuracy >= challenge.min_accuracy,
                accuracy: Some(accuracy),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TIERS: [TaskDifficulty; 3] = [TaskDifficulty::Easy, TaskDifficulty::Medium, TaskDifficulty::Hard];

    fn parse_question(question: &str) -> (i64, char, i64) {
        let parts: Vec<&str> = question.split(' ').collect();
        assert_eq!(parts.len(), 3, "bad question: {question}");
        (
            parts[0].parse().unwrap(),
            parts[1].chars().next().unwrap(),
            parts[2].parse().unwrap(),
        )
    }

    #[test]
    fn answers_match_question() {
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            for difficulty in TIERS {
                let problem = generate_math_problem(&mut rng, difficulty);
                let (lhs, op, rhs) = parse_question(&problem.question);

                let expected = match op {
                    '+' => (lhs + rhs) as f64,
                    '-' => (lhs - rhs) as f64,
                    '*' => (lhs * rhs) as f64,
                    '/' => {
                        assert_ne!(rhs, 0, "division by zero in {}", problem.question);
                        (lhs as f64 / rhs as f64 * 100.0).round() / 100.0
                    }
                    other => panic!("unexpected operator {other}"),
                };
                assert_eq!(problem.answer, expected, "{}", problem.question);
                assert!(problem.answer.is_finite());
            }
        }
    }

    #[test]
    fn operands_and_operators_follow_tier() {
        for seed in 0..300 {
            let mut rng = StdRng::seed_from_u64(seed);

            let (a, op, b) = parse_question(&generate_math_problem(&mut rng, TaskDifficulty::Easy).question);
            assert!((0..10).contains(&a) && (0..10).contains(&b));
            assert_eq!(op, '+');

            let (a, op, b) = parse_question(&generate_math_problem(&mut rng, TaskDifficulty::Medium).question);
            assert!((0..50).contains(&a) && (0..50).contains(&b));
            assert!("+-*".contains(op));

            let (a, op, b) = parse_question(&generate_math_problem(&mut rng, TaskDifficulty::Hard).question);
            assert!((0..100).contains(&a) && (0..100).contains(&b));
            assert!("+-*/".contains(op));
        }
    }

    #[test]
    fn options_are_four_distinct_including_answer() {
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            for difficulty in TIERS {
                let problem = generate_math_problem(&mut rng, difficulty);
                assert_eq!(problem.options.len(), 4);
                assert!(problem.options.contains(&problem.answer));
                for (i, a) in problem.options.iter().enumerate() {
                    for b in &problem.options[i + 1..] {
                        assert_ne!(a, b);
                    }
                }
            }
        }
    }

    // An RNG that always yields zero keeps drawing the same offset.
    #[test]
    fn options_terminate_when_sampling_keeps_colliding() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let options = generate_options(&mut rng, 7.0);

        assert_eq!(options.len(), 4);
        assert!(options.contains(&7.0));
    }

    #[test]
    fn exact_answer_passes_and_off_by_one_fails() {
        for seed in 0..300 {
            let mut rng = StdRng::seed_from_u64(seed);
            for difficulty in TIERS {
                let task = Task::Math(generate_math_problem(&mut rng, difficulty));
                let Task::Math(problem) = &task else { unreachable!() };

                assert!(verify_submission(&task, &problem.answer.to_string()).is_correct);
                assert!(!verify_submission(&task, &(problem.answer + 1.0).to_string()).is_correct);
            }
        }
    }

    #[test]
    fn rounded_division_must_match_exactly() {
        let task = Task::Math(MathProblem {
            question: "7 / 3".into(),
            answer: Operator::Divide.apply(7, 3),
            options: vec![],
        });

        assert!(verify_submission(&task, "2.33").is_correct);
        assert!(verify_submission(&task, " 2.33 ").is_correct);
        assert!(!verify_submission(&task, "2.333").is_correct);
        assert!(!verify_submission(&task, "").is_correct);
        assert!(!verify_submission(&task, "two").is_correct);
    }

    #[test]
    fn typing_thresholds_by_tier() {
        assert_eq!(generate_typing_challenge(TaskDifficulty::Easy).min_accuracy, 80.0);
        assert_eq!(generate_typing_challenge(TaskDifficulty::Medium).min_accuracy, 90.0);
        assert_eq!(generate_typing_challenge(TaskDifficulty::Hard).min_accuracy, 95.0);
    }

    #[test]
    fn accuracy_bounds() {
        assert_eq!(typing_accuracy("hello", "hello"), 100.0);
        assert_eq!(typing_accuracy("abc", "xyz"), 0.0);
        assert_eq!(typing_accuracy("", "abcd"), 0.0);
        assert_eq!(typing_accuracy("ab", "abcd"), 50.0);
        // one inserted char shifts everything after it
        assert_eq!(typing_accuracy("xabcd", "abcd"), 0.0);
    }

    #[test]
    fn accuracy_grows_as_mistakes_are_fixed() {
        let target: Vec<char> = "wake up now".chars().collect();
        let mut input = vec!['#'; target.len()];
        let mut previous = typing_accuracy(&input.iter().collect::<String>(), "wake up now");
        assert_eq!(previous, 0.0);

        for i in 0..target.len() {
            input[i] = target[i];
            let current = typing_accuracy(&input.iter().collect::<String>(), "wake up now");
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn cat_cot_falls_below_threshold() {
        let task = Task::Typing(TypingChallenge {
            text: "cat".into(),
            min_accuracy: 80.0,
        });
        let result = verify_submission(&task, "cot");

        let accuracy = result.accuracy.unwrap();
        assert!((accuracy - 66.67).abs() < 0.01);
        assert!(!result.is_correct);
    }

    #[test]
    fn puzzle_is_unsupported() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_task_with(&mut rng, TaskType::Puzzle, TaskDifficulty::Easy).unwrap_err();
        assert!(matches!(err, TaskError::UnsupportedTaskType(TaskType::Puzzle)));
    }

    #[test]
    fn generated_task_matches_requested_type() {
        let task = generate_task(TaskType::Typing, TaskDifficulty::Hard).unwrap();
        assert_eq!(task.task_type(), TaskType::Typing);
        assert!(verify_submission(&task, task.prompt()).is_correct);

        let task = generate_task(TaskType::Math, TaskDifficulty::Easy).unwrap();
        assert_eq!(task.task_type(), TaskType::Math);
    }
}
