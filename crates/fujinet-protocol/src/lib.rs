pub mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod specifier;
pub mod translator;

pub use codec::{HostCodec, SioCodec};
pub use command::{CommandCode, HostCommand, HostRequest};
pub use error::{ProtocolError, Result, TranslatorError};
pub use frame::{CommandFrame, ResponseFrame, ResponseMarker, sio_checksum};
pub use specifier::{DeviceSpecifier, SpecifierError};
pub use translator::{HostTranslator, SioHostTranslator};
