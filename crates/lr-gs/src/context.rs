//! Graphics context negotiation
//!
//! The frontend owns the GPU context; the core only describes what it wants.
//! When the frontend refuses a kind the core walks an ordered list of
//! alternatives, stopping at the first accepted one. `None` (software
//! output, no host context) always terminates the list and needs no host
//! round trip.

use lr_core::{Environment, HwContextKind, HwRenderRequest};

/// Ordered candidate kinds for a requested context kind.
/// Every kind appears at most once.
pub fn fallback_chain(requested: HwContextKind) -> Vec<HwContextKind> {
    use HwContextKind as K;

    let preferred: &[HwContextKind] = match requested {
        K::None => &[K::None],
        K::Direct3D => &[K::Direct3D, K::OpenGlCore, K::OpenGl, K::OpenGles3, K::None],
        // Legacy GL and the ES variants are reached through the core profile
        // first, so they share the generic list.
        _ => &[K::OpenGlCore, K::OpenGl, K::OpenGles3, K::None],
    };
    preferred.to_vec()
}

/// Context description sent to the frontend for `kind`
pub fn request_for(kind: HwContextKind) -> HwRenderRequest {
    let (version_major, version_minor, cache_context) = match kind {
        HwContextKind::Direct3D => (11, 0, true),
        HwContextKind::OpenGlCore => (3, 3, false),
        HwContextKind::OpenGl | HwContextKind::OpenGles3 => (3, 0, true),
        _ => (0, 0, false),
    };

    HwRenderRequest {
        kind,
        version_major,
        version_minor,
        depth: true,
        stencil: false,
        bottom_left_origin: true,
        cache_context,
    }
}

/// Walk the fallback chain for `requested` until the frontend accepts a
/// kind. Returns the accepted description, or `None` if every candidate
/// was refused.
pub fn negotiate(env: &dyn Environment, requested: HwContextKind) -> Option<HwRenderRequest> {
    for kind in fallback_chain(requested) {
        let request = request_for(kind);
        if kind == HwContextKind::None {
            tracing::info!("Using software output without a hardware context");
            return Some(request);
        }

        if env.set_hw_render(&request) {
            tracing::info!(
                "Hardware context accepted: {} {}.{}",
                kind,
                request.version_major,
                request.version_minor
            );
            return Some(request);
        }
        tracing::warn!("Frontend refused {} context, trying next", kind);
    }

    tracing::error!("No usable graphics context for {}", requested);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lr_core::{LogSink, PixelFormat, SystemAvInfo, VariableDescriptor};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Accepts only the listed kinds and records every request
    struct HwEnv {
        accepted: Vec<HwContextKind>,
        requests: Mutex<Vec<HwContextKind>>,
    }

    impl HwEnv {
        fn new(accepted: &[HwContextKind]) -> Self {
            Self {
                accepted: accepted.to_vec(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl Environment for HwEnv {
        fn set_pixel_format(&self, _format: PixelFormat) -> bool {
            true
        }
        fn log_interface(&self) -> Option<Arc<dyn LogSink>> {
            None
        }
        fn system_directory(&self) -> Option<PathBuf> {
            None
        }
        fn save_directory(&self) -> Option<PathBuf> {
            None
        }
        fn set_hw_render(&self, request: &HwRenderRequest) -> bool {
            self.requests.lock().push(request.kind);
            self.accepted.contains(&request.kind)
        }
        fn preferred_hw_render(&self) -> Option<HwContextKind> {
            None
        }
        fn set_variables(&self, _variables: &[VariableDescriptor]) -> bool {
            true
        }
        fn get_variable(&self, _key: &str) -> Option<String> {
            None
        }
        fn set_system_av_info(&self, _info: &SystemAvInfo) -> bool {
            true
        }
        fn set_disk_control(&self) -> bool {
            true
        }
        fn set_support_no_game(&self, _supported: bool) -> bool {
            true
        }
    }

    #[test]
    fn test_chain_has_no_repeats() {
        use HwContextKind as K;
        for kind in [
            K::None,
            K::OpenGl,
            K::OpenGles2,
            K::OpenGlCore,
            K::OpenGles3,
            K::OpenGlesVersion,
            K::Vulkan,
            K::Direct3D,
        ] {
            let chain = fallback_chain(kind);
            let unique: HashSet<_> = chain.iter().collect();
            assert_eq!(unique.len(), chain.len(), "{kind} repeats a candidate");
            assert_eq!(chain.last(), Some(&K::None));
        }
    }

    #[test]
    fn test_chain_order() {
        use HwContextKind as K;
        let generic = vec![K::OpenGlCore, K::OpenGl, K::OpenGles3, K::None];
        assert_eq!(fallback_chain(K::OpenGlCore), generic);
        assert_eq!(fallback_chain(K::OpenGl), generic);
        assert_eq!(fallback_chain(K::Vulkan), generic);
        assert_eq!(
            fallback_chain(K::Direct3D),
            vec![K::Direct3D, K::OpenGlCore, K::OpenGl, K::OpenGles3, K::None]
        );
        assert_eq!(fallback_chain(K::None), vec![K::None]);
    }

    #[test]
    fn test_request_parameters() {
        let core = request_for(HwContextKind::OpenGlCore);
        assert_eq!((core.version_major, core.version_minor), (3, 3));
        assert!(!core.cache_context);
        assert!(core.depth && core.bottom_left_origin);

        let d3d = request_for(HwContextKind::Direct3D);
        assert_eq!((d3d.version_major, d3d.version_minor), (11, 0));
        assert!(d3d.cache_context);

        let legacy = request_for(HwContextKind::OpenGl);
        assert_eq!((legacy.version_major, legacy.version_minor), (3, 0));
        assert!(legacy.cache_context);
    }

    #[test]
    fn test_negotiate_first_accepted() {
        let env = HwEnv::new(&[HwContextKind::OpenGlCore]);
        let accepted = negotiate(&env, HwContextKind::OpenGlCore).unwrap();
        assert_eq!(accepted.kind, HwContextKind::OpenGlCore);
        assert_eq!(*env.requests.lock(), vec![HwContextKind::OpenGlCore]);
    }

    #[test]
    fn test_negotiate_falls_back_to_es3() {
        let env = HwEnv::new(&[HwContextKind::OpenGles3]);
        let accepted = negotiate(&env, HwContextKind::Vulkan).unwrap();
        assert_eq!(accepted.kind, HwContextKind::OpenGles3);
        assert_eq!(
            *env.requests.lock(),
            vec![HwContextKind::OpenGlCore, HwContextKind::OpenGl, HwContextKind::OpenGles3]
        );
    }

    #[test]
    fn test_negotiate_ends_in_software() {
        let env = HwEnv::new(&[]);
        let accepted = negotiate(&env, HwContextKind::Direct3D).unwrap();
        assert_eq!(accepted.kind, HwContextKind::None);
        // Each hardware kind tried exactly once; None never reaches the host
        assert_eq!(env.requests.lock().len(), 4);
    }

    #[test]
    fn test_negotiate_none_skips_host() {
        let env = HwEnv::new(&[HwContextKind::OpenGlCore]);
        let accepted = negotiate(&env, HwContextKind::None).unwrap();
        assert_eq!(accepted.kind, HwContextKind::None);
        assert!(env.requests.lock().is_empty());
    }
}
