use std::path::PathBuf;

use crate::Result;
use gdal::{cpl::CslStringList, errors::GdalError};

/// Process wide GDAL configuration, applied once at startup and kept for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub debug_logging: bool,
    pub proj_db_search_location: Option<PathBuf>,
    pub config_options: Vec<(String, String)>,
}

impl Config {
    pub fn apply(&self) -> Result<()> {
        setup_logging(self.debug_logging);

        if let Some(proj_db_path) = &self.proj_db_search_location {
            let proj_db_path = proj_db_path.to_string_lossy().to_string();
            gdal::config::set_config_option("PROJ_DATA", proj_db_path.as_str())?;
        }

        for (key, value) in &self.config_options {
            log::debug!("GDAL config option {key}={value}");
            gdal::config::set_config_option(key, value)?;
        }

        Ok(())
    }
}

/// Route the GDAL error and debug messages through the log facade
pub fn setup_logging(debug: bool) {
    if debug && gdal::config::set_config_option("CPL_DEBUG", "ON").is_err() {
        log::debug!("Failed to set GDAL debug level")
    }

    gdal::config::set_error_handler(|sev, _ec, msg| {
        use gdal::errors::CplErrType;
        match sev {
            CplErrType::Debug => log::debug!("GDAL: {msg}"),
            CplErrType::Warning => log::warn!("GDAL: {msg}"),
            CplErrType::Failure | CplErrType::Fatal => log::error!("GDAL: {msg}"),
            CplErrType::None => {}
        }
    });
}

pub fn create_string_list<S: AsRef<str>>(options: &[S]) -> Result<CslStringList> {
    let mut result = CslStringList::new();
    for opt in options {
        result.add_string(opt.as_ref())?;
    }

    Ok(result)
}

pub fn check_rc(rc: gdal_sys::CPLErr::Type) -> std::result::Result<(), GdalError> {
    if rc != 0 {
        let msg = last_error_message();
        let last_err_no = unsafe { gdal_sys::CPLGetLastErrorNo() };
        Err(GdalError::CplError {
            class: rc,
            number: last_err_no,
            msg,
        })
    } else {
        Ok(())
    }
}

pub fn check_pointer<T>(ptr: *mut T, method_name: &'static str) -> std::result::Result<*mut T, GdalError> {
    if ptr.is_null() {
        let msg = last_error_message();
        unsafe { gdal_sys::CPLErrorReset() };
        Err(GdalError::NullPointer { method_name, msg })
    } else {
        Ok(ptr)
    }
}

fn raw_string_to_string(raw_ptr: *const std::ffi::c_char) -> String {
    if raw_ptr.is_null() {
        return String::new();
    }

    let c_str = unsafe { std::ffi::CStr::from_ptr(raw_ptr) };
    c_str.to_string_lossy().into_owned()
}

fn last_error_message() -> String {
    raw_string_to_string(unsafe { gdal_sys::CPLGetLastErrorMsg() })
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;

    use super::*;

    fn fetch_value(list: &CslStringList, key: &str) -> String {
        let key = std::ffi::CString::new(key).unwrap();
        raw_string_to_string(unsafe { gdal_sys::CSLFetchNameValue(list.as_ptr().cast(), key.as_ptr()) })
    }

    #[test]
    fn string_list_from_options() {
        let list = create_string_list(&["TILED=YES", "COMPRESS=LZW"]).unwrap();
        assert_eq!(fetch_value(&list, "TILED"), "YES");
        assert_eq!(fetch_value(&list, "COMPRESS"), "LZW");
        assert_eq!(fetch_value(&list, "PREDICTOR"), "");
    }

    #[test]
    fn null_pointer_is_an_error() {
        let res = check_pointer(std::ptr::null_mut::<c_void>(), "GDALOpen");
        assert!(matches!(res, Err(GdalError::NullPointer { method_name: "GDALOpen", .. })));
    }

    #[test]
    fn success_rc() {
        assert!(check_rc(gdal_sys::CPLErr::CE_None).is_ok());
    }
}
