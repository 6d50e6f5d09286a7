use std::time::{Duration, Instant};

use facet_box::{Descriptor, DescriptorRegistry, Erasable, EscapeConfig, Value};

use crate::{Jello, setup};

macro_rules! probes {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug)]
            struct $name(u32);
            impl Erasable for $name {}
        )*

        const PROBE_COUNT: usize = [$(stringify!($name)),*].len();

        fn box_every_probe(registry: &DescriptorRegistry, n: u32) {
            $(
                let probe = $name(n);
                let v = Value::erased_in(&probe, registry);
                let back = v.as_erased().and_then(|e| e.downcast_ref::<$name>());
                assert_eq!(back.map(|p| p.0), Some(n));
            )*
        }

        fn probe_descriptors() -> Vec<&'static Descriptor> {
            vec![$(Descriptor::of::<$name>()),*]
        }
    };
}

probes!(P00, P01, P02, P03, P04, P05, P06, P07, P08, P09, P10, P11, P12, P13, P14, P15);

#[test]
fn many_threads_many_types() {
    setup();
    let registry = DescriptorRegistry::new();
    std::thread::scope(|s| {
        for t in 0..16u32 {
            let registry = &registry;
            s.spawn(move || {
                EscapeConfig::new().scope(|| {
                    for i in 0..200 {
                        box_every_probe(registry, t * 1000 + i);
                    }
                });
            });
        }
    });
    assert_eq!(registry.len(), PROBE_COUNT);
    for d in probe_descriptors() {
        assert!(registry.contains(d), "{} was not registered", d.type_name());
    }
}

#[test]
fn global_registry_under_contention() {
    setup();
    std::thread::scope(|s| {
        for _ in 0..32 {
            s.spawn(|| {
                EscapeConfig::new().scope(|| {
                    let start = Instant::now();
                    while start.elapsed() < Duration::from_millis(100) {
                        let jello = Jello { neat: 1, feet: 2 };
                        assert!(Value::any(&jello).is_erased());
                    }
                });
            });
        }
    });
    assert!(DescriptorRegistry::global().contains(Descriptor::of::<Jello>()));
}
