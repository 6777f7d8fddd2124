/**
Reads a field from a `dirent` pointer, papering over platforms whose struct lacks it.

`d_type` is only read when the build script found it in `struct dirent` (`cfg(has_d_type)`),
otherwise `DT_UNKNOWN` is returned so the entry is reported as `Unknown`.

# Safety
The pointer must be non-null and point at the record returned by the latest `readdir` call
on a stream that is still open.
*/
#[cfg(unix)]
macro_rules! access_dirent {
    ($entry_ptr:expr, d_type) => {{
        #[cfg(has_d_type)]
        {
            // SAFETY: Caller must ensure pointer is valid
            (*$entry_ptr).d_type
        }

        #[cfg(not(has_d_type))]
        {
            let _ = $entry_ptr;
            0_u8 // DT_UNKNOWN
        }
    }};

    ($entry_ptr:expr, d_name) => {{
        // SAFETY: Caller must ensure pointer is valid, `d_name` is always NUL terminated
        core::ffi::CStr::from_ptr((&raw const (*$entry_ptr).d_name).cast::<libc::c_char>())
    }};
}

/// A compile time assertion, similar to a `static_assert` from c++
macro_rules! const_assert {
    ($cond:expr $(,)?) => {
        const _: () = {
            if !$cond {
                panic!(concat!("const assertion failed: ", stringify!($cond)));
            }
        };
    };
    ($cond:expr, $($arg:tt)+) => {
        const _: () = {
            if !$cond {
                panic!($($arg)+);
            }
        };
    };
}
