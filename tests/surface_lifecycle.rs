use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use bitmapcache::diag::{self, DiagKind};
use bitmapcache::render::device::RecordingDevice;
use bitmapcache::util::config::SurfaceConfig;
use bitmapcache::{
    BitmapResource, CacheEntryHandle, DisplayState, DisplaySurface, Drawable, EntryStore, OriginKey,
};

fn surface() -> DisplaySurface<RecordingDevice> {
    DisplaySurface::with_config(RecordingDevice::new(), SurfaceConfig::default())
}

fn bitmap(fill: u8) -> BitmapResource {
    BitmapResource::new(2, 2, vec![fill; 16])
}

fn drew_resource_of(drawable: &Drawable, handle: &CacheEntryHandle) -> bool {
    match (drawable.content(), handle.resource()) {
        (Some(drawn), Some(res)) => Arc::ptr_eq(drawn, &res),
        _ => false,
    }
}

#[test]
fn scenarios_bind_replace_detach() {
    let mut store = EntryStore::new();
    let h1 = store.insert("https://img.example/h1.png", bitmap(1));
    let h2 = store.insert("https://img.example/h2.png", bitmap(2));
    let mut s = surface();

    // A: Unbound -> Bound(h1)
    s.bind(Some(h1.clone()), false).unwrap();
    assert!(h1.in_use());
    assert!(s.current_handle().unwrap().ptr_eq(&h1));
    assert!(drew_resource_of(s.device().last().unwrap(), &h1));

    // B: Bound(h1) -> Bound(h2)
    s.bind(Some(h2.clone()), false).unwrap();
    assert!(!h1.in_use());
    assert!(h2.in_use());
    assert!(s.current_handle().unwrap().ptr_eq(&h2));

    // C: detach
    s.on_detach();
    assert!(!h2.in_use());
    assert!(s.current_handle().is_none());
    assert_eq!(s.display_state(), DisplayState::Empty);
    assert!(s.device().last().unwrap().is_empty());
}

#[test]
fn scenario_reclaimed_entry_degrades_to_empty() {
    let mut store = EntryStore::new();
    let h3 = store.insert("https://img.example/reclaimed-h3.png", bitmap(3));
    assert_eq!(store.reclaim_unused(), 1);
    assert!(!h3.valid());

    let mut s = surface();
    s.bind(Some(h3.clone()), false).unwrap();

    assert!(s.current_handle().is_none());
    assert!(!h3.in_use());
    assert_eq!(s.device().draw_count(), 1);
    assert!(s.device().last().unwrap().is_empty());
    assert!(diag::recent().iter().any(|d| {
        d.kind == DiagKind::InvalidResource && d.message.contains("reclaimed-h3.png")
    }));
}

#[test]
fn reclaimed_entry_releases_previous_binding() {
    let mut store = EntryStore::new();
    let shown = store.insert("k/shown", bitmap(1));
    let gone = store.insert("k/gone", bitmap(2));

    let mut s = surface();
    s.bind(Some(shown.clone()), false).unwrap();
    store.reclaim_unused();
    assert!(!gone.valid());
    assert!(shown.valid());

    s.bind(Some(gone), false).unwrap();
    assert!(!shown.in_use());
    assert!(s.current_handle().is_none());
}

#[test]
fn at_most_one_entry_marked_per_surface() {
    let handles: Vec<_> = (0..4u8)
        .map(|i| CacheEntryHandle::new(format!("seq/{i}").as_str(), bitmap(i)))
        .collect();
    let mut s = surface();

    // Fixed pseudo-random walk over bind/clear/rebind.
    let mut x: u32 = 7;
    for _ in 0..200 {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let pick = (x >> 16) % 6;
        match pick {
            0..=3 => s.bind(Some(handles[pick as usize].clone()), pick % 2 == 0).unwrap(),
            4 => s.clear().unwrap(),
            _ => s.on_detach(),
        }

        let marked: usize = handles.iter().map(|h| h.use_count()).sum();
        assert!(marked <= 1);
        match s.current_handle() {
            Some(cur) => {
                assert_eq!(marked, 1);
                assert!(cur.in_use());
            }
            None => assert_eq!(marked, 0),
        }
    }
}

#[test]
fn clear_twice_matches_clear_once() {
    let h = CacheEntryHandle::new("idempotent", bitmap(9));
    let mut s = surface();
    s.bind(Some(h.clone()), false).unwrap();

    s.clear().unwrap();
    let once = (h.use_count(), s.current_handle().is_none(), s.display_state());
    s.clear().unwrap();
    let twice = (h.use_count(), s.current_handle().is_none(), s.display_state());

    assert_eq!(once, (0, true, DisplayState::Empty));
    assert_eq!(once, twice);
}

#[test]
fn two_surfaces_share_one_entry() {
    let mut store = EntryStore::new();
    let h = store.insert("shared/avatar", bitmap(5));
    let mut list_row = surface();
    let mut detail = surface();

    list_row.bind(Some(h.clone()), false).unwrap();
    detail.bind(Some(h.clone()), true).unwrap();
    assert_eq!(h.use_count(), 2);

    list_row.on_detach();
    assert_eq!(store.reclaim_unused(), 0);
    assert!(h.valid());

    drop(detail);
    assert_eq!(store.reclaim_unused(), 1);
    assert!(!h.valid());
}

#[test]
fn raw_content_releases_like_cached_content() {
    let cached = CacheEntryHandle::new("raw/previous", bitmap(4));
    let mut s = surface();
    s.bind(Some(cached.clone()), false).unwrap();

    s.bind_raw(bitmap(8)).unwrap();
    assert!(!cached.in_use());
    let raw = s.current_handle().unwrap().clone();
    assert!(raw.in_use());

    s.on_detach();
    assert!(!raw.in_use());
}

#[test]
fn concurrent_reclaim_never_invalidates_bound_entries() {
    const KEYS: usize = 6;
    const SURFACES: usize = 4;
    const ROUNDS: usize = 500;

    let keys: Vec<String> = (0..KEYS).map(|i| format!("stress/{i}")).collect();
    let store = Arc::new(Mutex::new(EntryStore::new()));
    let seen: Arc<Mutex<Vec<CacheEntryHandle>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let mut store = store.lock().unwrap();
        let mut seen = seen.lock().unwrap();
        for key in &keys {
            seen.push(store.insert(key.as_str(), bitmap(1)));
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let reclaimer = {
        let store = Arc::clone(&store);
        let seen = Arc::clone(&seen);
        let stop = Arc::clone(&stop);
        let keys = keys.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let mut store = store.lock().unwrap();
                store.reclaim_unused();
                // Refill what was reclaimed so surfaces keep finding entries.
                for key in &keys {
                    let origin = OriginKey::parse(key);
                    if !store.contains_key(&origin) {
                        let handle = store.insert(origin, bitmap(2));
                        seen.lock().unwrap().push(handle);
                    }
                }
                drop(store);
                thread::yield_now();
            }
        })
    };

    let workers: Vec<_> = (0..SURFACES)
        .map(|n| {
            let store = Arc::clone(&store);
            let keys = keys.clone();
            thread::spawn(move || {
                let mut s = surface();
                for round in 0..ROUNDS {
                    if round % 7 == 3 {
                        s.clear().unwrap();
                    } else {
                        let key = OriginKey::parse(&keys[(round * 5 + n) % keys.len()]);
                        let handle = store.lock().unwrap().get(&key).cloned();
                        s.bind(handle, round % 2 == 0).unwrap();
                    }
                    if let Some(bound) = s.current_handle() {
                        assert!(bound.valid(), "bound entry reclaimed: {bound:?}");
                        assert!(bound.in_use());
                        assert!(bound.resource().is_some());
                    }
                }
                s.on_detach();
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    reclaimer.join().unwrap();

    for handle in seen.lock().unwrap().iter() {
        assert_eq!(handle.use_count(), 0, "{handle:?}");
    }
}
