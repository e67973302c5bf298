pub use crate::error::{Error, Result};
pub use image::DynamicImage;
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use region::{Point, Rect, Transform};
pub use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};
