//! Declarative macros for module exports.

/// Exports the `on_module_info` entry point with static metadata.
///
/// The strings are embedded NUL-terminated in the module library, so the
/// descriptor stays valid for as long as the library is mapped. The
/// version must be semver (`"1.2.0"`); the host rejects anything else
/// when it reads the descriptor back.
///
/// # Example
///
/// ```
/// modulith_sdk::export_module_info! {
///     author: "Jane Doe",
///     name: "telemetry",
///     version: "1.2.0",
///     description: "Telemetry collector",
/// }
/// ```
#[macro_export]
macro_rules! export_module_info {
    (
        author: $author:expr,
        name: $name:expr,
        version: $version:expr,
        description: $description:expr $(,)?
    ) => {
        #[no_mangle]
        pub extern "C" fn on_module_info() -> $crate::abi::RawModuleInfo {
            $crate::abi::RawModuleInfo {
                abi_version: $crate::abi::MODULE_ABI_VERSION,
                author: concat!($author, "\0").as_ptr() as *const ::core::ffi::c_char,
                name: concat!($name, "\0").as_ptr() as *const ::core::ffi::c_char,
                version: concat!($version, "\0").as_ptr() as *const ::core::ffi::c_char,
                description: concat!($description, "\0").as_ptr() as *const ::core::ffi::c_char,
            }
        }
    };
}
