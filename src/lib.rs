//! # gagsolve - gag combat calculator and fill-to-kill solver
//!
//! Answers two questions about a single round against one target:
//!
//! - How likely is this set of gags to knock the target out this turn?
//! - Which gags can be added to the ones already chosen so that the target
//!   goes down, and which of those additions are best?
//!
//! ## Core Concepts
//!
//! - **Track**: one of seven gag categories, resolved in a fixed order
//! - **Gag**: a catalog definition; a selected gag is a [`GagInstance`]
//! - **Damage**: [`total_damage`] assumes every gag hits
//! - **Probability**: [`ko_probability`] walks every hit/miss outcome of the
//!   per-track accuracy rolls
//! - **Solver**: [`solve`] enumerates lethal additions under roster limits
//!   and ranks them
//!
//! ## Usage
//!
//! ```rust
//! use gagsolve::{solve, FillRequest, GagCatalog, GagKey, Track};
//!
//! let catalog = GagCatalog::standard();
//! let lure = catalog.instance(&GagKey::new(Track::Lure, 5, "$10 Bill"))?;
//!
//! let request = FillRequest::builder(10)
//!     .with_current(lure)
//!     .max_toons(3)
//!     .build()?;
//!
//! for option in solve(&request) {
//!     println!("{:.1}% with {} gag(s)", option.accuracy * 100.0, option.added.len());
//! }
//! # Ok::<(), gagsolve::GagError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core model
pub mod catalog;
pub mod error;
pub mod gag;
pub mod health;
pub mod track;

// Calculators
pub mod accuracy;
pub mod damage;
pub mod roster;

// Solver and execution
pub mod runtime;
pub mod solver;

// Favorites
pub mod favorites;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use catalog::GagCatalog;
pub use error::{CalcError, ExecutionError, GagError, GagResult, ValidationError};
pub use gag::{AffectsNum, AffectsType, GagDefinition, GagInstance, GagKey, InstanceId};
pub use health::health;
pub use track::{DamageType, PerTrack, Track};

pub use accuracy::{explain, ko_probability, trace, AccuracyOptions, Trace};
pub use damage::{max_killable_level, total_damage, DamageResult, TargetStatus};
pub use roster::{Roster, ToonRestriction};

pub use runtime::{RuntimeConfig, SolveHandle, SolverRuntime};
pub use solver::{
    solve, solve_json, solve_value, try_solve, FillOption, FillRequest, FillRequestBuilder, FillResponse,
    LevelExclusions, RawFillRequest, SearchLimits, SortMode, SortWeights,
};

pub use favorites::{FavoriteCombo, HpMode, ScenarioKey};
pub use storage::{FavoritesStore, InMemoryFavoritesStore, JsonFileFavoritesStore, StorageError};
