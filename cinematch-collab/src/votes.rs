//! Vote bookkeeping and the matching rule.
//!
//! Matches are never stored. They are derived from the vote table and the
//! live participant set every time they are asked for, so a participant who
//! joins late keeps a movie from matching until they like it too.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{Id, MovieData, MovieId, ParticipantData, ParticipantId};

pub type VoteId = Id<VoteData>;

/// A participant's like or dislike of one movie
#[derive(Debug, Clone, PartialEq)]
pub struct VoteData {
    pub id: VoteId,
    pub participant_id: ParticipantId,
    pub movie_id: MovieId,
    pub liked: bool,
    pub cast_at: DateTime<Utc>,
}

/// A movie every participant of a room liked
#[derive(Debug, Clone, PartialEq)]
pub struct MatchData {
    pub movie: MovieData,
    /// Names of the participants, in the order they joined
    pub participants: Vec<String>,
}

/// All votes of a room, at most one per participant and movie.
#[derive(Debug, Default)]
pub struct VoteTable {
    votes: HashMap<(MovieId, ParticipantId), VoteData>,
}

impl VoteTable {
    /// Records a vote, replacing an earlier one for the same participant and movie.
    /// A replaced vote keeps its id.
    pub fn upsert(&mut self, participant_id: ParticipantId, movie_id: MovieId, liked: bool) -> VoteData {
        let cast_at = Utc::now();

        let vote = self
            .votes
            .entry((movie_id, participant_id))
            .and_modify(|vote| {
                vote.liked = liked;
                vote.cast_at = cast_at;
            })
            .or_insert_with(|| VoteData {
                id: VoteId::new(),
                participant_id,
                movie_id,
                liked,
                cast_at,
            });

        vote.clone()
    }

    pub fn get(&self, participant_id: ParticipantId, movie_id: MovieId) -> Option<&VoteData> {
        self.votes.get(&(movie_id, participant_id))
    }

    pub fn has_voted(&self, participant_id: ParticipantId, movie_id: MovieId) -> bool {
        self.get(participant_id, movie_id).is_some()
    }

    pub fn likes(&self, participant_id: ParticipantId, movie_id: MovieId) -> bool {
        self.get(participant_id, movie_id).is_some_and(|v| v.liked)
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}

/// Returns true if every participant liked the movie and there are enough of them.
pub fn is_match(
    votes: &VoteTable,
    participants: &[ParticipantData],
    movie_id: MovieId,
    quorum: usize,
) -> bool {
    !participants.is_empty()
        && participants.len() >= quorum
        && participants.iter().all(|p| votes.likes(p.id, movie_id))
}

/// Computes the matches of a room, ordered by movie id.
pub fn compute_matches(
    movies: &[MovieData],
    participants: &[ParticipantData],
    votes: &VoteTable,
    quorum: usize,
) -> Vec<MatchData> {
    let names: Vec<String> = participants.iter().map(|p| p.name.clone()).collect();

    let mut matches: Vec<_> = movies
        .iter()
        .filter(|movie| is_match(votes, participants, movie.id, quorum))
        .map(|movie| MatchData {
            movie: movie.clone(),
            participants: names.clone(),
        })
        .collect();

    matches.sort_by_key(|m| m.movie.id);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str) -> ParticipantData {
        ParticipantData::new(name.to_string(), format!("session-{name}"))
    }

    fn movie(id: MovieId) -> MovieData {
        MovieData {
            id,
            title: format!("Movie {id}"),
            year: None,
            genre: None,
            poster_url: None,
            description: None,
        }
    }

    #[test]
    fn test_upsert_keeps_one_vote_per_pair() {
        let alice = participant("Alice");
        let mut votes = VoteTable::default();

        let first = votes.upsert(alice.id, 1, true);
        let second = votes.upsert(alice.id, 1, false);

        assert_eq!(votes.len(), 1);
        assert_eq!(first.id, second.id, "an overwritten vote keeps its id");
        assert!(!votes.likes(alice.id, 1));
    }

    #[test]
    fn test_match_requires_every_participant() {
        let alice = participant("Alice");
        let bob = participant("Bob");
        let participants = vec![alice.clone(), bob.clone()];
        let mut votes = VoteTable::default();

        votes.upsert(alice.id, 1, true);
        assert!(!is_match(&votes, &participants, 1, 2));

        votes.upsert(bob.id, 1, true);
        assert!(is_match(&votes, &participants, 1, 2));

        votes.upsert(bob.id, 1, false);
        assert!(!is_match(&votes, &participants, 1, 2));
    }

    #[test]
    fn test_late_joiner_undoes_a_match() {
        let alice = participant("Alice");
        let bob = participant("Bob");
        let carol = participant("Carol");
        let mut votes = VoteTable::default();

        votes.upsert(alice.id, 3, true);
        votes.upsert(bob.id, 3, true);

        let movies = vec![movie(3)];
        let before = compute_matches(&movies, &[alice.clone(), bob.clone()], &votes, 2);
        let after = compute_matches(&movies, &[alice, bob, carol], &votes, 2);

        assert_eq!(before.len(), 1);
        assert!(after.is_empty(), "carol has not liked movie 3 yet");
    }

    #[test]
    fn test_quorum_blocks_single_participant_matches() {
        let alice = participant("Alice");
        let mut votes = VoteTable::default();
        votes.upsert(alice.id, 1, true);

        assert!(!is_match(&votes, &[alice.clone()], 1, 2));
        assert!(is_match(&votes, &[alice], 1, 1));
        assert!(!is_match(&votes, &[], 1, 0), "an empty room never matches");
    }

    #[test]
    fn test_matches_are_ordered_by_movie_id() {
        let alice = participant("Alice");
        let bob = participant("Bob");
        let participants = vec![alice.clone(), bob.clone()];
        let mut votes = VoteTable::default();

        for id in [9, 2, 5] {
            votes.upsert(alice.id, id, true);
            votes.upsert(bob.id, id, true);
        }

        let movies = vec![movie(9), movie(5), movie(2)];
        let matches = compute_matches(&movies, &participants, &votes, 2);
        let ids: Vec<_> = matches.iter().map(|m| m.movie.id).collect();

        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(matches[0].participants, vec!["Alice", "Bob"]);
    }
}
