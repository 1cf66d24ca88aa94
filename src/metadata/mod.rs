crate::reexport!(table);
crate::reexport!(schema);
crate::reexport!(database);
crate::reexport!(source);
crate::reexport!(keywords);
crate::reexport!(postgres);
crate::reexport!(mysql);
crate::reexport!(dialect);

use crate::*;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
