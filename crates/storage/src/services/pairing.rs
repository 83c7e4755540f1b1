//! Double round-robin pairing with the circle method.
//!
//! Pure and storage-agnostic: participants are any `Clone + Eq + Hash`
//! identity, given in the order the caller wants them seeded.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FixtureError;
use crate::models::Leg;

/// How home and away are chosen for each pairing of the first leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeAwayPolicy {
    /// Even matchday index: first of the pair hosts. Odd: second hosts.
    #[default]
    Parity,
    /// Parity, but swap sides when the parity choice repeats a side for
    /// either participant and the swap repeats none.
    AvoidRepeats,
}

impl FromStr for HomeAwayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parity" => Ok(Self::Parity),
            "avoid_repeats" | "avoid-repeats" => Ok(Self::AvoidRepeats),
            other => Err(format!(
                "unknown home/away policy '{other}', expected 'parity' or 'avoid_repeats'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing<P> {
    pub home: P,
    pub away: P,
}

impl<P: Clone> Pairing<P> {
    fn reversed(&self) -> Self {
        Self {
            home: self.away.clone(),
            away: self.home.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchday<P> {
    /// 1-based matchday number within the leg
    pub number: usize,
    pub pairings: Vec<Pairing<P>>,
    /// Participant drawn against the bye, if the count is odd
    pub resting: Option<P>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule<P> {
    pub first_leg: Vec<Matchday<P>>,
    pub second_leg: Vec<Matchday<P>>,
}

impl<P> Schedule<P> {
    pub fn matchdays_per_leg(&self) -> usize {
        self.first_leg.len()
    }

    pub fn leg(&self, leg: Leg) -> &[Matchday<P>] {
        match leg {
            Leg::First => &self.first_leg,
            Leg::Second => &self.second_leg,
        }
    }

    pub fn match_count(&self) -> usize {
        self.first_leg
            .iter()
            .chain(&self.second_leg)
            .map(|md| md.pairings.len())
            .sum()
    }

    /// Every pairing in generation order: leg, matchday, then slot.
    pub fn iter(&self) -> impl Iterator<Item = (Leg, &Matchday<P>, usize, &Pairing<P>)> {
        Leg::ALL.into_iter().flat_map(move |leg| {
            self.leg(leg).iter().flat_map(move |md| {
                md.pairings
                    .iter()
                    .enumerate()
                    .map(move |(slot, pairing)| (leg, md, slot, pairing))
            })
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

/// Build the home-and-away schedule for `participants`.
///
/// Repeated participants are scheduled once, at their first position. Fails
/// only when fewer than two distinct participants are given.
pub fn compute_schedule<P>(
    participants: &[P],
    policy: HomeAwayPolicy,
) -> Result<Schedule<P>, FixtureError>
where
    P: Clone + Eq + Hash,
{
    let mut seen = HashSet::with_capacity(participants.len());
    let distinct: Vec<&P> = participants.iter().filter(|p| seen.insert(*p)).collect();
    if distinct.len() < 2 {
        return Err(FixtureError::NotEnoughParticipants {
            found: distinct.len(),
        });
    }

    // `None` is the bye.
    let mut arrangement: Vec<Option<P>> = distinct.into_iter().cloned().map(Some).collect();
    if arrangement.len() % 2 == 1 {
        arrangement.push(None);
    }

    let n = arrangement.len();
    let mut last_side: HashMap<P, Side> = HashMap::new();
    let mut first_leg = Vec::with_capacity(n - 1);

    for day in 0..n - 1 {
        let mut pairings = Vec::with_capacity(n / 2);
        let mut resting = None;

        for offset in 0..n / 2 {
            let (first, second) = match (&arrangement[offset], &arrangement[n - 1 - offset]) {
                (Some(a), Some(b)) => (a, b),
                (Some(p), None) | (None, Some(p)) => {
                    resting = Some(p.clone());
                    continue;
                }
                (None, None) => continue,
            };

            let (mut home, mut away) = if day % 2 == 0 {
                (first, second)
            } else {
                (second, first)
            };

            if policy == HomeAwayPolicy::AvoidRepeats {
                let repeats = |h: &P, a: &P| {
                    last_side.get(h) == Some(&Side::Home) || last_side.get(a) == Some(&Side::Away)
                };
                if repeats(home, away) && !repeats(away, home) {
                    std::mem::swap(&mut home, &mut away);
                }
            }

            last_side.insert(home.clone(), Side::Home);
            last_side.insert(away.clone(), Side::Away);
            pairings.push(Pairing {
                home: home.clone(),
                away: away.clone(),
            });
        }

        first_leg.push(Matchday {
            number: day + 1,
            pairings,
            resting,
        });

        arrangement[1..].rotate_right(1);
    }

    let second_leg = first_leg
        .iter()
        .map(|md| Matchday {
            number: md.number,
            pairings: md.pairings.iter().map(Pairing::reversed).collect(),
            resting: md.resting.clone(),
        })
        .collect();

    Ok(Schedule {
        first_leg,
        second_leg,
    })
}
