/// Data layer: catalog types, sources, schema detection, filtering, composition.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / Google Sheets
///        │
///        ▼
///   ┌──────────────┐
///   │ loader/sheets │  DatasetSource::load → Dataset
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  load once, refresh on demand, sample on failure
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  column names → RegionMap
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  categories + search tokens → row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  view     │  base + region price columns, renamed → ViewTable
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod sheets;
pub mod view;
