//! Lexical superstates and states.
//!
//! A superstate names the nest of contexts a position sits in: I7 prose, I6
//! inclusions, strings, substitutions, I6 routines and comments, I7 embedded in
//! I6, and any of those inside an extension's documentation extract. It omits
//! I7 comments, which nest without bound; a [`LexicalState`] adds their depth.
//! Seen as a pushdown automaton, the superstate is the current vertex and the
//! comment depth is the stack height.

use std::fmt;

macro_rules! superstates {
    ($($name:ident => $display:literal,)*) => {
        /// Lexical context of a position between two codepoints, ignoring I7
        /// comments.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum LexicalSuperstate {
            $($name,)*
        }

        impl LexicalSuperstate {
            /// Every superstate, in declaration order.
            pub const ALL: [LexicalSuperstate; LexicalSuperstate::COUNT] = [
                $(LexicalSuperstate::$name,)*
            ];

            fn display(self) -> &'static str {
                match self {
                    $(LexicalSuperstate::$name => $display,)*
                }
            }
        }
    };
}

superstates! {
    // Neither I6 nor an extract
    I7 => "7",
    I7String => "\"7\"",
    I7Substitution => "\"[7]\"",
    I7ExtensionDocumentation => "--7--",
    // I6 outside a routine, no embedded I7
    I6 => "(-6-)",
    I6Character => "(-'6'-)",
    I6String => "(-\"6\"-)",
    I6Comment => "(-!6-)",
    // I6 in a routine, no embedded I7
    I6InRoutine => "(-[6]-)",
    I6CharacterInRoutine => "(-['6']-)",
    I6StringInRoutine => "(-[\"6\"]-)",
    I6CommentInRoutine => "(-[!6]-)",
    // I7 embedded in I6 outside a routine
    I7InI6 => "(+7+)",
    I7StringInI6 => "(+\"7\"+)",
    I7SubstitutionInI6 => "(+\"[7]\"+)",
    I7InI6Comment => "!(+7+)",
    I7StringInI6Comment => "!(+\"7\"+)",
    I7SubstitutionInI6Comment => "!(+\"[7]\"+)",
    // I7 embedded in I6 in a routine
    I7InI6InRoutine => "[(+7+)]",
    I7StringInI6InRoutine => "[(+\"7\"+)]",
    I7SubstitutionInI6InRoutine => "[(+\"[7]\"+)]",
    I7InI6CommentInRoutine => "[!(+7+)]",
    I7StringInI6CommentInRoutine => "[!(+\"7\"+)]",
    I7SubstitutionInI6CommentInRoutine => "[!(+\"[7]\"+)]",
    // Extract, no I6
    I7InExtract => "*:7",
    I7StringInExtract => "*:\"7\"",
    I7SubstitutionInExtract => "*:\"[7]\"",
    // Extract, I6 outside a routine, no embedded I7
    I6InExtract => "*:(-6-)",
    I6CharacterInExtract => "*:(-'6'-)",
    I6StringInExtract => "*:(-\"6\"-)",
    I6CommentInExtract => "*:(-!6-)",
    // Extract, I6 in a routine, no embedded I7
    I6InRoutineInExtract => "*:(-[6]-)",
    I6CharacterInRoutineInExtract => "*:(-['6']-)",
    I6StringInRoutineInExtract => "*:(-[\"6\"]-)",
    I6CommentInRoutineInExtract => "*:(-[!6]-)",
    // Extract, I7 embedded in I6 outside a routine
    I7InI6InExtract => "*:(+7+)",
    I7StringInI6InExtract => "*:(+\"7\"+)",
    I7SubstitutionInI6InExtract => "*:(+\"[7]\"+)",
    I7InI6CommentInExtract => "*:!(+7+)",
    I7StringInI6CommentInExtract => "*:!(+\"7\"+)",
    I7SubstitutionInI6CommentInExtract => "*:!(+\"[7]\"+)",
    // Extract, I7 embedded in I6 in a routine
    I7InI6InRoutineInExtract => "*:[(+7+)]",
    I7StringInI6InRoutineInExtract => "*:[(+\"7\"+)]",
    I7SubstitutionInI6InRoutineInExtract => "*:[(+\"[7]\"+)]",
    I7InI6CommentInRoutineInExtract => "*:[!(+7+)]",
    I7StringInI6CommentInRoutineInExtract => "*:[!(+\"7\"+)]",
    I7SubstitutionInI6CommentInRoutineInExtract => "*:[!(+\"[7]\"+)]",
}

impl LexicalSuperstate {
    pub const COUNT: usize = 47;

    /// Number of superstates that can hold I7 comments.
    pub const COMMENTABLE_COUNT: usize = 11;

    /// The superstates that can hold I7 comments, indexed by comment slot.
    pub const COMMENTABLE: [LexicalSuperstate; Self::COMMENTABLE_COUNT] = [
        LexicalSuperstate::I7,
        LexicalSuperstate::I7ExtensionDocumentation,
        LexicalSuperstate::I7InI6,
        LexicalSuperstate::I7InI6Comment,
        LexicalSuperstate::I7InI6InRoutine,
        LexicalSuperstate::I7InI6CommentInRoutine,
        LexicalSuperstate::I7InExtract,
        LexicalSuperstate::I7InI6InExtract,
        LexicalSuperstate::I7InI6CommentInExtract,
        LexicalSuperstate::I7InI6InRoutineInExtract,
        LexicalSuperstate::I7InI6CommentInRoutineInExtract,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position among [`COMMENTABLE`](Self::COMMENTABLE), or `None` if this
    /// superstate cannot hold I7 comments.
    pub fn comment_slot(self) -> Option<usize> {
        use LexicalSuperstate as S;
        Some(match self {
            S::I7 => 0,
            S::I7ExtensionDocumentation => 1,
            S::I7InI6 => 2,
            S::I7InI6Comment => 3,
            S::I7InI6InRoutine => 4,
            S::I7InI6CommentInRoutine => 5,
            S::I7InExtract => 6,
            S::I7InI6InExtract => 7,
            S::I7InI6CommentInExtract => 8,
            S::I7InI6InRoutineInExtract => 9,
            S::I7InI6CommentInRoutineInExtract => 10,
            _ => return None,
        })
    }

    pub fn is_commentable(self) -> bool {
        self.comment_slot().is_some()
    }

    /// Commentable superstates whose comment levels survive a change of
    /// superstate: an I6 comment ended by a line break while I7 comments are
    /// open inside it.
    pub fn has_movable_comments(self) -> bool {
        matches!(
            self,
            LexicalSuperstate::I7InI6Comment
                | LexicalSuperstate::I7InI6CommentInRoutine
                | LexicalSuperstate::I7InI6CommentInExtract
                | LexicalSuperstate::I7InI6CommentInRoutineInExtract
        )
    }
}

impl fmt::Display for LexicalSuperstate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// A superstate plus the I7 comment nesting depth.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexicalState {
    superstate: LexicalSuperstate,
    comment_depth: u8,
}

/// The state at the start of every buffer.
pub const INITIAL_LEXICAL_STATE: LexicalState = LexicalState::new(LexicalSuperstate::I7);

impl LexicalState {
    #[inline]
    pub const fn new(superstate: LexicalSuperstate) -> Self {
        LexicalState {
            superstate,
            comment_depth: 0,
        }
    }

    #[inline]
    pub const fn with_depth(superstate: LexicalSuperstate, comment_depth: u8) -> Self {
        LexicalState {
            superstate,
            comment_depth,
        }
    }

    #[inline]
    pub const fn superstate(self) -> LexicalSuperstate {
        self.superstate
    }

    #[inline]
    pub const fn comment_depth(self) -> u8 {
        self.comment_depth
    }

    /// Whether the position is inside at least one I7 comment.
    #[inline]
    pub const fn in_comment(self) -> bool {
        self.comment_depth > 0
    }
}

impl From<LexicalSuperstate> for LexicalState {
    fn from(superstate: LexicalSuperstate) -> Self {
        LexicalState::new(superstate)
    }
}

impl fmt::Display for LexicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.superstate)?;
        if self.comment_depth > 0 {
            write!(f, "+{}", self.comment_depth)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
