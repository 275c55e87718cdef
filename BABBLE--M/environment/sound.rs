use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{error::EnvironmentError, kinematics::Formants, KEYFRAMES};

/// Number of values describing a sound: five F1 keyframes then five F2 keyframes.
pub const SOUND_DIMS: usize = 2 * KEYFRAMES.len();

/// Best error assigned to a template before any sound was produced.
pub const INITIAL_BEST_ERROR: f64 = 10.0;

/// Words used by the caregiver; the first one names the toy.
pub const CAREGIVER_WORDS: [&str; 4] = ["eyu", "oey", "eou", "oyi"];

/// `(F1, F2)` in Hz of the vowels the caregiver's words are built from.
fn vowel_hz(vowel: char) -> Option<(f64, f64)> {
    match vowel {
        'o' => Some((500.0, 900.0)),
        'y' => Some((300.0, 1700.0)),
        'u' => Some((300.0, 800.0)),
        'e' => Some((400.0, 2200.0)),
        'i' => Some((300.0, 2300.0)),
        _ => None,
    }
}

/// Canonical caregiver word with its running best-match error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanSoundTemplate {
    /// Word, e.g. `eyu`.
    pub name: String,
    /// F1 at the five keyframes followed by F2 at the five keyframes, log2 Hz.
    pub keyframes: [f64; SOUND_DIMS],
    /// Smallest distance between this template and any produced sound.
    pub best_error: f64,
}

impl HumanSoundTemplate {
    /// Creates a template from explicit keyframes.
    #[must_use]
    pub fn new(name: impl Into<String>, keyframes: [f64; SOUND_DIMS]) -> Self {
        Self {
            name: name.into(),
            keyframes,
            best_error: INITIAL_BEST_ERROR,
        }
    }

    /// Builds a three-vowel word. Keyframes sit on the first vowel, halfway to
    /// the second, on the second, halfway to the third, and on the third.
    pub fn from_word(word: &str) -> Result<Self, EnvironmentError> {
        let vowels = word
            .chars()
            .map(|c| {
                vowel_hz(c).map(|(f1, f2)| (f1.log2(), f2.log2())).ok_or_else(|| {
                    EnvironmentError::InvalidConfig(format!("unknown vowel `{c}` in `{word}`"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let &[a, b, c] = vowels.as_slice() else {
            return Err(EnvironmentError::InvalidConfig(format!(
                "caregiver word `{word}` must have three vowels"
            )));
        };
        let mid = |p: (f64, f64), q: (f64, f64)| ((p.0 + q.0) / 2.0, (p.1 + q.1) / 2.0);
        let frames = [a, mid(a, b), b, mid(b, c), c];
        let mut keyframes = [0.0; SOUND_DIMS];
        for (i, (f1, f2)) in frames.iter().enumerate() {
            keyframes[i] = *f1;
            keyframes[i + KEYFRAMES.len()] = *f2;
        }
        Ok(Self::new(word, keyframes))
    }

    /// Euclidean distance to a produced sound.
    #[must_use]
    pub fn distance(&self, keyframes: &[f64; SOUND_DIMS]) -> f64 {
        self.keyframes
            .iter()
            .zip(keyframes)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Outcome of a successful recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    /// Closest template under the tolerance; this is the recognised word.
    pub sound: String,
    /// First template under the tolerance in enumeration order.
    pub first_match: String,
    /// Distance to `sound`.
    pub error: f64,
}

impl Recognition {
    /// True when the first qualifying template is not the closest one.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.sound != self.first_match
    }
}

/// Matches produced vocal trajectories against the caregiver's words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundRecognizer {
    templates: IndexMap<String, HumanSoundTemplate>,
    tolerance: f64,
}

impl SoundRecognizer {
    /// Creates a recognizer; template order is the enumeration order.
    #[must_use]
    pub fn new(templates: Vec<HumanSoundTemplate>, tolerance: f64) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|template| (template.name.clone(), template))
                .collect(),
            tolerance,
        }
    }

    /// Recognizer over [`CAREGIVER_WORDS`].
    pub fn caregiver_words(tolerance: f64) -> Result<Self, EnvironmentError> {
        let templates = CAREGIVER_WORDS
            .iter()
            .map(|word| HumanSoundTemplate::from_word(word))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(templates, tolerance))
    }

    /// Samples a trajectory at the keyframes, F1 values first.
    #[must_use]
    pub fn keyframes_of(trajectory: &[Formants]) -> [f64; SOUND_DIMS] {
        let mut keyframes = [0.0; SOUND_DIMS];
        for (i, step) in KEYFRAMES.iter().enumerate() {
            if let Some(formants) = trajectory.get(*step) {
                keyframes[i] = formants.f1;
                keyframes[i + KEYFRAMES.len()] = formants.f2;
            }
        }
        keyframes
    }

    /// Recognizes a vocal trajectory.
    pub fn recognize(&mut self, trajectory: &[Formants]) -> Option<Recognition> {
        self.recognize_keyframes(&Self::keyframes_of(trajectory))
    }

    /// Recognizes keyframes, updating every template's best error.
    pub fn recognize_keyframes(&mut self, keyframes: &[f64; SOUND_DIMS]) -> Option<Recognition> {
        let mut first: Option<String> = None;
        let mut best: Option<(String, f64)> = None;
        for template in self.templates.values_mut() {
            let error = template.distance(keyframes);
            template.best_error = template.best_error.min(error);
            if error < self.tolerance {
                if first.is_none() {
                    first = Some(template.name.clone());
                }
                if best.as_ref().map_or(true, |(_, e)| error < *e) {
                    best = Some((template.name.clone(), error));
                }
            }
        }
        let (sound, error) = best?;
        let recognition = Recognition {
            first_match: first.unwrap_or_else(|| sound.clone()),
            sound,
            error,
        };
        if recognition.is_ambiguous() {
            tracing::debug!(
                first = %recognition.first_match,
                best = %recognition.sound,
                "first qualifying template differs from closest"
            );
        }
        Some(recognition)
    }

    /// Template naming the toy.
    #[must_use]
    pub fn target(&self) -> Option<&HumanSoundTemplate> {
        self.templates.first().map(|(_, t)| t)
    }

    /// Template at enumeration index `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&HumanSoundTemplate> {
        self.templates.get_index(index).map(|(_, t)| t)
    }

    /// Template by word.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&HumanSoundTemplate> {
        self.templates.get(name)
    }

    /// Words in enumeration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Best error per word.
    #[must_use]
    pub fn best_errors(&self) -> IndexMap<String, f64> {
        self.templates
            .iter()
            .map(|(name, t)| (name.clone(), t.best_error))
            .collect()
    }

    /// Match tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

/// What the caregiver is asked to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelRequest {
    /// The toy's own name.
    Toy,
    /// Any word other than the toy's name.
    Random,
}

impl FromStr for LabelRequest {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toy1" | "toy" => Ok(Self::Toy),
            "random" => Ok(Self::Random),
            other => Err(EnvironmentError::UnsupportedLabelRequest(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TIMESTEPS;

    fn trajectory_for(template: &HumanSoundTemplate) -> Vec<Formants> {
        let mut trajectory = vec![Formants { f1: 8.5, f2: 10.25 }; TIMESTEPS];
        for (i, step) in KEYFRAMES.iter().enumerate() {
            trajectory[*step] = Formants {
                f1: template.keyframes[i],
                f2: template.keyframes[i + KEYFRAMES.len()],
            };
        }
        trajectory
    }

    #[test]
    fn words_have_expected_keyframes() {
        let eyu = HumanSoundTemplate::from_word("eyu").unwrap();
        assert!((eyu.keyframes[0] - 400f64.log2()).abs() < 1e-12);
        assert!((eyu.keyframes[4] - 300f64.log2()).abs() < 1e-12);
        assert!((eyu.keyframes[9] - 800f64.log2()).abs() < 1e-12);
        assert!((eyu.best_error - INITIAL_BEST_ERROR).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_malformed_words() {
        assert!(HumanSoundTemplate::from_word("ab").is_err());
        assert!(HumanSoundTemplate::from_word("eeee").is_err());
    }

    #[test]
    fn exact_template_is_recognized_with_zero_error() {
        let mut recognizer = SoundRecognizer::caregiver_words(0.4).unwrap();
        let oey = recognizer.template("oey").unwrap().clone();
        let recognition = recognizer.recognize(&trajectory_for(&oey)).unwrap();
        assert_eq!(recognition.sound, "oey");
        assert!(recognition.error.abs() < 1e-12);
        assert!(recognizer.template("oey").unwrap().best_error.abs() < 1e-12);
    }

    #[test]
    fn neutral_sound_is_not_recognized() {
        let mut recognizer = SoundRecognizer::caregiver_words(0.4).unwrap();
        let neutral = vec![Formants { f1: 8.5, f2: 10.25 }; TIMESTEPS];
        assert!(recognizer.recognize(&neutral).is_none());
        assert!(recognizer
            .best_errors()
            .values()
            .all(|e| *e < INITIAL_BEST_ERROR));
    }

    #[test]
    fn recognition_is_deterministic() {
        let eou = HumanSoundTemplate::from_word("eou").unwrap();
        let trajectory = trajectory_for(&eou);
        let mut a = SoundRecognizer::caregiver_words(0.4).unwrap();
        let mut b = SoundRecognizer::caregiver_words(0.4).unwrap();
        assert_eq!(a.recognize(&trajectory), b.recognize(&trajectory));
        assert_eq!(a.recognize(&trajectory), b.recognize(&trajectory));
    }

    #[test]
    fn closest_candidate_wins_over_first() {
        let near = HumanSoundTemplate::new("near", [0.1; SOUND_DIMS]);
        let far = HumanSoundTemplate::new("far", [0.05; SOUND_DIMS]);
        let mut recognizer = SoundRecognizer::new(vec![far, near], 1.0);
        let recognition = recognizer.recognize_keyframes(&[0.1; SOUND_DIMS]).unwrap();
        assert_eq!(recognition.sound, "near");
        assert_eq!(recognition.first_match, "far");
        assert!(recognition.is_ambiguous());
    }

    #[test]
    fn best_errors_never_increase() {
        let mut recognizer = SoundRecognizer::caregiver_words(0.4).unwrap();
        let mut previous = recognizer.best_errors();
        for shift in [0.5, 0.1, 0.9, 0.0, 0.3] {
            recognizer.recognize_keyframes(&[8.5 + shift; SOUND_DIMS]);
            let current = recognizer.best_errors();
            for (name, err) in &current {
                assert!(*err <= previous[name]);
            }
            previous = current;
        }
    }

    #[test]
    fn label_requests_parse() {
        assert_eq!("toy1".parse::<LabelRequest>().unwrap(), LabelRequest::Toy);
        assert_eq!("random".parse::<LabelRequest>().unwrap(), LabelRequest::Random);
        assert_eq!(
            "toy7".parse::<LabelRequest>(),
            Err(EnvironmentError::UnsupportedLabelRequest("toy7".into()))
        );
    }
}
