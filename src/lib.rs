pub mod error;
pub mod package;

pub use error::{Error, Result};
pub use package::Package;
pub use package::directory::{update_directory, DirectoryEntry, DirectoryResource};
pub use package::exemplar::{Cohort, Exemplar, ExemplarData, ExemplarFormat, ExemplarKind};
pub use package::format::{ResourceFormat, TGIKeyEntry, TGIKeys};
pub use package::header::PackageHeader;
pub use package::index::{IndexEntry, TGI};
pub use package::names::PropertyNameTable;
pub use package::property::{Property, PropertyType, PropertyValues};
pub use package::qfs::{self, PackagerInfo};
pub use package::resource::{GenericResource, LTextResource, PackageResource, Resource, TextResource, TypedResource};
