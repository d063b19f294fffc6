//! OpenDocument spreadsheet input
//!
//! - `package`: locate and read `content.xml` (zipped `.ods` or extracted `.xml`)
//! - `reader`: stream tables and logical rows out of the XML

pub mod package;
pub mod reader;

pub use package::read_content_xml;
pub use reader::{SheetCell, SheetItem, SheetReader, SheetRow, MAX_COLUMNS, MAX_ROW_REPEAT};
