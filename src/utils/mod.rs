pub(crate) mod crc;
pub(crate) mod path;
