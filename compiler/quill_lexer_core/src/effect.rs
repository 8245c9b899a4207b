//! The lexer monoid.
//!
//! Every monoid can be modelled as a set of endomorphisms; here the elements
//! are functions from [`LexicalState`] to [`LexicalState`]. Each token carries
//! the function describing how lexing its text moves the state, and summing
//! tokens in a sequence composes those functions.
//!
//! Comment depths are unbounded in principle, so a function is stored finitely:
//! the image of every superstate at depth zero, and for each commentable
//! superstate a short table of images at depths `1..=n` followed by a tail
//! rule mapping any deeper depth `d` to `(target, d + delta)`.

use crate::{LexicalState, LexicalSuperstate};
use smallvec::SmallVec;
use std::sync::OnceLock;

use LexicalSuperstate as S;

/// Images of one commentable superstate at positive comment depths.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CommentImages {
    /// Images of depths `1..=explicit.len()`.
    explicit: SmallVec<[LexicalState; 2]>,
    /// Superstate reached from depths beyond the table.
    target: LexicalSuperstate,
    /// Depth change applied beyond the table.
    delta: i16,
}

impl CommentImages {
    fn unchanged(superstate: LexicalSuperstate) -> Self {
        CommentImages {
            explicit: SmallVec::new(),
            target: superstate,
            delta: 0,
        }
    }

    #[inline]
    fn tail(&self, depth: usize) -> LexicalState {
        let shifted = i16::try_from(depth).unwrap_or(i16::MAX).saturating_add(self.delta);
        let clamped = u8::try_from(shifted.clamp(0, i16::from(u8::MAX))).unwrap_or(u8::MAX);
        LexicalState::with_depth(self.target, clamped)
    }

    #[inline]
    fn image(&self, depth: u8) -> LexicalState {
        let depth = usize::from(depth);
        match self.explicit.get(depth - 1) {
            Some(&image) => image,
            None => self.tail(depth),
        }
    }
}

/// How lexing some text transforms the lexical state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexerEffect {
    /// Image of each superstate at comment depth zero.
    images: [LexicalState; LexicalSuperstate::COUNT],
    /// Images at positive depths, indexed by comment slot.
    comments: [CommentImages; LexicalSuperstate::COMMENTABLE_COUNT],
}

impl LexerEffect {
    /// The effect of empty text.
    pub fn identity() -> Self {
        LexerEffect {
            images: LexicalSuperstate::ALL.map(LexicalState::new),
            comments: LexicalSuperstate::COMMENTABLE.map(CommentImages::unchanged),
        }
    }

    /// Open (`+1`) or close (`-1`) one I7 comment level wherever comments are
    /// allowed. Closing at depth zero does nothing.
    pub fn depth_change(delta: i8) -> Self {
        debug_assert!((-1..=1).contains(&delta));
        let mut effect = Self::identity();
        for images in &mut effect.comments {
            images.delta = i16::from(delta);
        }
        if delta > 0 {
            for superstate in LexicalSuperstate::COMMENTABLE {
                effect.images[superstate.index()] = LexicalState::with_depth(superstate, 1);
            }
        }
        effect
    }

    /// Move `from` to `to` outside comments; everything else is unchanged.
    pub fn transition(from: LexicalSuperstate, to: LexicalSuperstate) -> Self {
        let mut effect = Self::identity();
        effect.images[from.index()] = to.into();
        effect
    }

    /// Exchange `a` and `b` outside comments.
    pub fn swap(a: LexicalSuperstate, b: LexicalSuperstate) -> Self {
        let mut effect = Self::transition(a, b);
        effect.images[b.index()] = a.into();
        effect
    }

    /// Move `from` to `to`, taking any open I7 comments along.
    pub fn carrying_comments(from: LexicalSuperstate, to: LexicalSuperstate) -> Self {
        let mut effect = Self::transition(from, to);
        if let Some(slot) = from.comment_slot() {
            debug_assert!(to.is_commentable(), "{to} cannot hold comments");
            effect.comments[slot].target = to;
        }
        effect
    }

    /// Apply the effect to a state.
    pub fn apply(&self, state: LexicalState) -> LexicalState {
        let superstate = state.superstate();
        let depth = state.comment_depth();
        if depth == 0 {
            return self.images[superstate.index()];
        }
        match superstate.comment_slot() {
            Some(slot) => self.comments[slot].image(depth),
            None => {
                debug_assert!(false, "{superstate} cannot hold comments");
                state
            }
        }
    }

    /// The effect of this effect's text followed by `next`'s text.
    #[must_use]
    pub fn then(&self, next: &LexerEffect) -> LexerEffect {
        let images = self.images.map(|image| next.apply(image));
        let comments = std::array::from_fn(|slot| self.compose_comments(slot, next));
        LexerEffect { images, comments }
    }

    fn compose_comments(&self, slot: usize, next: &LexerEffect) -> CommentImages {
        let superstate = LexicalSuperstate::COMMENTABLE[slot];
        let own = &self.comments[slot];
        let (target, delta, next_len) = match own.target.comment_slot() {
            Some(next_slot) => {
                let next_images = &next.comments[next_slot];
                (
                    next_images.target,
                    own.delta + next_images.delta,
                    next_images.explicit.len(),
                )
            }
            None => (own.target, own.delta, 0),
        };
        // Depths past the table must reach `next`'s tail at a positive depth.
        let next_len = i16::try_from(next_len).unwrap_or(i16::MAX);
        let own_len = i16::try_from(own.explicit.len()).unwrap_or(i16::MAX);
        let len = own_len
            .max(next_len - own.delta)
            .max(-own.delta)
            .clamp(0, i16::from(u8::MAX));
        let mut images = CommentImages {
            explicit: (1..=u8::try_from(len).unwrap_or(u8::MAX))
                .map(|depth| next.apply(self.apply(LexicalState::with_depth(superstate, depth))))
                .collect(),
            target,
            delta,
        };
        while let Some(&last) = images.explicit.last() {
            let depth = images.explicit.len();
            let in_range = i16::try_from(depth).unwrap_or(i16::MAX) + delta >= 0;
            if in_range && images.tail(depth) == last {
                images.explicit.pop();
            } else {
                break;
            }
        }
        images
    }

    /// Fold a chain of effects in order.
    pub fn chain(effects: impl IntoIterator<Item = LexerEffect>) -> LexerEffect {
        effects
            .into_iter()
            .fold(Self::identity(), |sum, effect| sum.then(&effect))
    }
}

impl Default for LexerEffect {
    fn default() -> Self {
        Self::identity()
    }
}

/// The effects a single token can have.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LexicalEffect {
    /// Anything not listed below.
    PlainText,
    /// `"`
    DoubleQuote,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `\n---- DOCUMENTATION ----\n`
    DocumentationBreak,
    /// A documentation break followed by tabs.
    DocumentationBreakFollowedByIndentation,
    /// A line break followed by tabs.
    Indentation,
    /// A line break.
    BareNewline,
    /// `(-`
    LeftCyclops,
    /// `-)`
    RightCyclops,
    /// `'`, except the middle of `'''`
    SingleQuote,
    /// `!`
    Bang,
    /// `(+`
    LeftCrosseyedCyclops,
    /// `+)`
    RightCrosseyedCyclops,
}

impl LexicalEffect {
    pub const COUNT: usize = 14;

    pub const ALL: [LexicalEffect; Self::COUNT] = [
        LexicalEffect::PlainText,
        LexicalEffect::DoubleQuote,
        LexicalEffect::LeftBracket,
        LexicalEffect::RightBracket,
        LexicalEffect::DocumentationBreak,
        LexicalEffect::DocumentationBreakFollowedByIndentation,
        LexicalEffect::Indentation,
        LexicalEffect::BareNewline,
        LexicalEffect::LeftCyclops,
        LexicalEffect::RightCyclops,
        LexicalEffect::SingleQuote,
        LexicalEffect::Bang,
        LexicalEffect::LeftCrosseyedCyclops,
        LexicalEffect::RightCrosseyedCyclops,
    ];

    /// The shared effect table entry.
    pub fn effect(self) -> &'static LexerEffect {
        static TABLE: OnceLock<[LexerEffect; LexicalEffect::COUNT]> = OnceLock::new();
        &TABLE.get_or_init(|| LexicalEffect::ALL.map(LexicalEffect::build))[self as usize]
    }

    /// Apply the effect to a state.
    pub fn apply(self, state: LexicalState) -> LexicalState {
        self.effect().apply(state)
    }

    fn build(self) -> LexerEffect {
        type E = LexerEffect;
        match self {
            LexicalEffect::PlainText => E::identity(),
            LexicalEffect::DoubleQuote => E::chain([
                E::swap(S::I7, S::I7String),
                E::transition(S::I7Substitution, S::I7),
                E::swap(S::I6, S::I6String),
                E::swap(S::I6InRoutine, S::I6StringInRoutine),
                E::swap(S::I7InI6, S::I7StringInI6),
                E::transition(S::I7SubstitutionInI6, S::I7InI6),
                E::swap(S::I7InI6Comment, S::I7StringInI6Comment),
                E::transition(S::I7SubstitutionInI6Comment, S::I7InI6Comment),
                E::swap(S::I7InI6InRoutine, S::I7StringInI6InRoutine),
                E::transition(S::I7SubstitutionInI6InRoutine, S::I7InI6InRoutine),
                E::swap(S::I7InI6CommentInRoutine, S::I7StringInI6CommentInRoutine),
                E::transition(S::I7SubstitutionInI6CommentInRoutine, S::I7InI6CommentInRoutine),
                E::swap(S::I7InExtract, S::I7StringInExtract),
                E::transition(S::I7SubstitutionInExtract, S::I7InExtract),
                E::swap(S::I6InExtract, S::I6StringInExtract),
                E::swap(S::I6InRoutineInExtract, S::I6StringInRoutineInExtract),
                E::swap(S::I7InI6InExtract, S::I7StringInI6InExtract),
                E::transition(S::I7SubstitutionInI6InExtract, S::I7InI6InExtract),
                E::swap(S::I7InI6CommentInExtract, S::I7StringInI6CommentInExtract),
                E::transition(S::I7SubstitutionInI6CommentInExtract, S::I7InI6CommentInExtract),
                E::swap(S::I7InI6InRoutineInExtract, S::I7StringInI6InRoutineInExtract),
                E::transition(
                    S::I7SubstitutionInI6InRoutineInExtract,
                    S::I7InI6InRoutineInExtract,
                ),
                E::swap(
                    S::I7InI6CommentInRoutineInExtract,
                    S::I7StringInI6CommentInRoutineInExtract,
                ),
                E::transition(
                    S::I7SubstitutionInI6CommentInRoutineInExtract,
                    S::I7InI6CommentInRoutineInExtract,
                ),
            ]),
            LexicalEffect::LeftBracket => E::chain([
                E::transition(S::I7String, S::I7Substitution),
                E::transition(S::I6, S::I6InRoutine),
                E::transition(S::I7StringInI6, S::I7SubstitutionInI6),
                E::transition(S::I7StringInI6Comment, S::I7SubstitutionInI6Comment),
                E::transition(S::I7StringInI6InRoutine, S::I7SubstitutionInI6InRoutine),
                E::transition(
                    S::I7StringInI6CommentInRoutine,
                    S::I7SubstitutionInI6CommentInRoutine,
                ),
                E::transition(S::I7StringInExtract, S::I7SubstitutionInExtract),
                E::transition(S::I6InExtract, S::I6InRoutineInExtract),
                E::transition(S::I7StringInI6InExtract, S::I7SubstitutionInI6InExtract),
                E::transition(
                    S::I7StringInI6CommentInExtract,
                    S::I7SubstitutionInI6CommentInExtract,
                ),
                E::transition(
                    S::I7StringInI6InRoutineInExtract,
                    S::I7SubstitutionInI6InRoutineInExtract,
                ),
                E::transition(
                    S::I7StringInI6CommentInRoutineInExtract,
                    S::I7SubstitutionInI6CommentInRoutineInExtract,
                ),
                E::depth_change(1),
            ]),
            LexicalEffect::RightBracket => E::chain([
                E::transition(S::I7Substitution, S::I7String),
                E::transition(S::I6InRoutine, S::I6),
                E::transition(S::I7SubstitutionInI6, S::I7StringInI6),
                E::transition(S::I7SubstitutionInI6Comment, S::I7StringInI6Comment),
                E::transition(S::I7SubstitutionInI6InRoutine, S::I7StringInI6InRoutine),
                E::transition(
                    S::I7SubstitutionInI6CommentInRoutine,
                    S::I7StringInI6CommentInRoutine,
                ),
                E::transition(S::I7SubstitutionInExtract, S::I7StringInExtract),
                E::transition(S::I6InRoutineInExtract, S::I6InExtract),
                E::transition(S::I7SubstitutionInI6InExtract, S::I7StringInI6InExtract),
                E::transition(
                    S::I7SubstitutionInI6CommentInExtract,
                    S::I7StringInI6CommentInExtract,
                ),
                E::transition(
                    S::I7SubstitutionInI6InRoutineInExtract,
                    S::I7StringInI6InRoutineInExtract,
                ),
                E::transition(
                    S::I7SubstitutionInI6CommentInRoutineInExtract,
                    S::I7StringInI6CommentInRoutineInExtract,
                ),
                E::depth_change(-1),
            ]),
            LexicalEffect::DocumentationBreak => {
                E::transition(S::I7, S::I7ExtensionDocumentation)
            }
            LexicalEffect::DocumentationBreakFollowedByIndentation => {
                E::transition(S::I7, S::I7InExtract)
            }
            LexicalEffect::Indentation => E::chain(
                [E::transition(S::I7ExtensionDocumentation, S::I7InExtract)]
                    .into_iter()
                    .chain(line_break_ends_i6_comments()),
            ),
            LexicalEffect::BareNewline => E::chain(
                line_break_ends_i6_comments()
                    .into_iter()
                    .take(8)
                    .chain(
                        [
                            S::I7InExtract,
                            S::I7StringInExtract,
                            S::I7SubstitutionInExtract,
                            S::I6InExtract,
                            S::I6CharacterInExtract,
                            S::I6StringInExtract,
                            S::I6CommentInExtract,
                            S::I6InRoutineInExtract,
                            S::I6CharacterInRoutineInExtract,
                            S::I6StringInRoutineInExtract,
                            S::I6CommentInRoutineInExtract,
                            S::I7InI6InExtract,
                            S::I7StringInI6InExtract,
                            S::I7SubstitutionInI6InExtract,
                            S::I7InI6CommentInExtract,
                            S::I7StringInI6CommentInExtract,
                            S::I7SubstitutionInI6CommentInExtract,
                            S::I7InI6InRoutineInExtract,
                            S::I7StringInI6InRoutineInExtract,
                            S::I7SubstitutionInI6InRoutineInExtract,
                            S::I7InI6CommentInRoutineInExtract,
                            S::I7StringInI6CommentInRoutineInExtract,
                            S::I7SubstitutionInI6CommentInRoutineInExtract,
                        ]
                        .map(|from| E::transition(from, S::I7ExtensionDocumentation)),
                    ),
            ),
            LexicalEffect::LeftCyclops => E::chain([
                E::transition(S::I7, S::I6),
                E::transition(S::I7InExtract, S::I6InExtract),
            ]),
            LexicalEffect::RightCyclops => E::chain(
                LexicalSuperstate::ALL[S::I6.index()..S::I7InExtract.index()]
                    .iter()
                    .map(|&from| E::transition(from, S::I7))
                    .chain(
                        LexicalSuperstate::ALL[S::I6InExtract.index()..]
                            .iter()
                            .map(|&from| E::transition(from, S::I7InExtract)),
                    ),
            ),
            LexicalEffect::SingleQuote => E::chain([
                E::swap(S::I6, S::I6Character),
                E::swap(S::I6InRoutine, S::I6CharacterInRoutine),
                E::swap(S::I6InExtract, S::I6CharacterInExtract),
                E::swap(S::I6InRoutineInExtract, S::I6CharacterInRoutineInExtract),
            ]),
            LexicalEffect::Bang => E::chain([
                E::transition(S::I6, S::I6Comment),
                E::transition(S::I6InRoutine, S::I6CommentInRoutine),
                E::transition(S::I6InExtract, S::I6CommentInExtract),
                E::transition(S::I6InRoutineInExtract, S::I6CommentInRoutineInExtract),
            ]),
            LexicalEffect::LeftCrosseyedCyclops => E::chain([
                E::transition(S::I6, S::I7InI6),
                E::transition(S::I6InRoutine, S::I7InI6InRoutine),
                E::transition(S::I6InExtract, S::I7InI6InExtract),
                E::transition(S::I6InRoutineInExtract, S::I7InI6InRoutineInExtract),
            ]),
            LexicalEffect::RightCrosseyedCyclops => E::chain(
                [
                    (S::I7InI6, S::I6),
                    (S::I7StringInI6, S::I6),
                    (S::I7SubstitutionInI6, S::I6),
                    (S::I7InI6Comment, S::I6Comment),
                    (S::I7StringInI6Comment, S::I6Comment),
                    (S::I7SubstitutionInI6Comment, S::I6Comment),
                    (S::I7InI6InRoutine, S::I6InRoutine),
                    (S::I7StringInI6InRoutine, S::I6InRoutine),
                    (S::I7SubstitutionInI6InRoutine, S::I6InRoutine),
                    (S::I7InI6CommentInRoutine, S::I6CommentInRoutine),
                    (S::I7StringInI6CommentInRoutine, S::I6CommentInRoutine),
                    (S::I7SubstitutionInI6CommentInRoutine, S::I6CommentInRoutine),
                    (S::I7InI6InExtract, S::I6InExtract),
                    (S::I7StringInI6InExtract, S::I6InExtract),
                    (S::I7SubstitutionInI6InExtract, S::I6InExtract),
                    (S::I7InI6CommentInExtract, S::I6CommentInExtract),
                    (S::I7StringInI6CommentInExtract, S::I6CommentInExtract),
                    (S::I7SubstitutionInI6CommentInExtract, S::I6CommentInExtract),
                    (S::I7InI6InRoutineInExtract, S::I6InRoutineInExtract),
                    (S::I7StringInI6InRoutineInExtract, S::I6InRoutineInExtract),
                    (S::I7SubstitutionInI6InRoutineInExtract, S::I6InRoutineInExtract),
                    (S::I7InI6CommentInRoutineInExtract, S::I6CommentInRoutineInExtract),
                    (S::I7StringInI6CommentInRoutineInExtract, S::I6CommentInRoutineInExtract),
                    (
                        S::I7SubstitutionInI6CommentInRoutineInExtract,
                        S::I6CommentInRoutineInExtract,
                    ),
                ]
                .map(|(from, to)| E::transition(from, to)),
            ),
        }
    }
}

/// Line breaks end I6 comments. Any I7 comments open inside embedded I7 stay
/// open. The first eight entries cover text outside extracts.
fn line_break_ends_i6_comments() -> [LexerEffect; 16] {
    type E = LexerEffect;
    [
        E::transition(S::I6Comment, S::I6),
        E::transition(S::I6CommentInRoutine, S::I6InRoutine),
        E::carrying_comments(S::I7InI6Comment, S::I7InI6),
        E::carrying_comments(S::I7StringInI6Comment, S::I7StringInI6),
        E::carrying_comments(S::I7SubstitutionInI6Comment, S::I7SubstitutionInI6),
        E::carrying_comments(S::I7InI6CommentInRoutine, S::I7InI6InRoutine),
        E::carrying_comments(S::I7StringInI6CommentInRoutine, S::I7StringInI6InRoutine),
        E::carrying_comments(
            S::I7SubstitutionInI6CommentInRoutine,
            S::I7SubstitutionInI6InRoutine,
        ),
        E::transition(S::I6CommentInExtract, S::I6InExtract),
        E::transition(S::I6CommentInRoutineInExtract, S::I6InRoutineInExtract),
        E::carrying_comments(S::I7InI6CommentInExtract, S::I7InI6InExtract),
        E::carrying_comments(S::I7StringInI6CommentInExtract, S::I7StringInI6InExtract),
        E::carrying_comments(
            S::I7SubstitutionInI6CommentInExtract,
            S::I7SubstitutionInI6InExtract,
        ),
        E::carrying_comments(S::I7InI6CommentInRoutineInExtract, S::I7InI6InRoutineInExtract),
        E::carrying_comments(
            S::I7StringInI6CommentInRoutineInExtract,
            S::I7StringInI6InRoutineInExtract,
        ),
        E::carrying_comments(
            S::I7SubstitutionInI6CommentInRoutineInExtract,
            S::I7SubstitutionInI6InRoutineInExtract,
        ),
    ]
}
