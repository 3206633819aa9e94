//! Integration tests for loading volume sequences from disk.
//!
//! Each test writes synthetic `.vol` files into its own directory under the
//! system temp dir and removes it afterwards.

use std::path::PathBuf;

use volprobe_core::*;

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("volprobe_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn constant_grid(size: UVec3, value: f32) -> VolumeGrid {
    let mut grid = VolumeGrid::new(size, 1);
    grid.set_range(Vec3::ZERO, size.as_vec3());
    grid.data_mut().fill(value);
    grid
}

#[test]
fn test_non_power_of_two_volume_is_padded() {
    let tmp = TempDir::new("pad");
    let path = tmp.0.join("smoke.vol");
    let mut grid = VolumeGrid::new(UVec3::new(100, 50, 30), 1);
    grid.set_range(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.3));
    for (i, v) in grid.data_mut().iter_mut().enumerate() {
        *v = (i % 7) as f32;
    }
    write_vol(&path, &grid).unwrap();

    let loaded = read_vol(&path).unwrap();
    assert_eq!(loaded.size(), UVec3::new(128, 64, 32));
    assert_eq!(loaded.bbox_min(), Vec3::ZERO);
    assert!((loaded.bbox_max() - Vec3::new(1.28, 0.64, 0.32)).length() < 1e-5);
    assert!((loaded.voxel_pitch() - Vec3::splat(0.01)).length() < 1e-6);

    // Stored samples land at their original coordinates.
    for &(x, y, z) in &[(0, 0, 0), (99, 49, 29), (37, 12, 5)] {
        assert_eq!(loaded.get(x, y, z, 0), grid.get(x, y, z, 0));
    }
    // The padded tail is zero.
    assert_eq!(loaded.get(100, 0, 0, 0), 0.0);
    assert_eq!(loaded.get(0, 50, 0, 0), 0.0);
    assert_eq!(loaded.get(127, 63, 31, 0), 0.0);
}

#[test]
fn test_sequence_load_orders_frames_by_name() {
    let tmp = TempDir::new("order");
    let size = UVec3::splat(4);
    // Written out of order; names sort as frame 0, 1, 2.
    for (name, value) in [
        ("density_002.vol", 3.0),
        ("density_000.vol", 1.0),
        ("density_001.vol", 2.0),
    ] {
        write_vol(tmp.0.join(name), &constant_grid(size, value)).unwrap();
    }
    std::fs::write(tmp.0.join("notes.txt"), "not a volume").unwrap();

    let layout = GridLayout::uniform(4, 2);
    let seq = MarginedVolumeSequence::load(&tmp.0, "density", None, layout, 0.5).unwrap();
    assert_eq!(seq.num_frames(), 3);
    for i in 0..3 {
        let frame = seq.frame(i);
        assert_eq!(frame.density.size(), UVec3::splat(8));
        assert_eq!(frame.density.get(3, 3, 3, 0), (i + 1) as f32 * 0.5);
        assert_eq!(frame.density.get(0, 3, 3, 0), 0.0);
        assert!(frame.emission.data().iter().all(|&v| v == 0.0));
    }
}

#[test]
fn test_density_and_emission_are_paired() {
    let tmp = TempDir::new("pair");
    let size = UVec3::splat(2);
    for i in 0..2 {
        write_vol(tmp.0.join(format!("density_{i}.vol")), &constant_grid(size, 1.0)).unwrap();
        write_vol(
            tmp.0.join(format!("emission_{i}.vol")),
            &constant_grid(size, i as f32 + 0.5),
        )
        .unwrap();
    }

    let layout = GridLayout::uniform(2, 1);
    let seq =
        MarginedVolumeSequence::load(&tmp.0, "density", Some("emission"), layout, 1.0).unwrap();
    assert_eq!(seq.num_frames(), 2);
    for c in 0..3 {
        assert_eq!(seq.frame(0).emission.get(1, 1, 1, c), 0.5);
        assert_eq!(seq.frame(1).emission.get(2, 2, 2, c), 1.5);
        assert_eq!(seq.frame(1).emission.get(0, 0, 0, c), 0.0);
    }
}

#[test]
fn test_frame_count_mismatch_is_fatal() {
    let tmp = TempDir::new("mismatch");
    let size = UVec3::splat(2);
    for i in 0..5 {
        write_vol(tmp.0.join(format!("density_{i}.vol")), &constant_grid(size, 1.0)).unwrap();
    }
    for i in 0..4 {
        write_vol(tmp.0.join(format!("emission_{i}.vol")), &constant_grid(size, 1.0)).unwrap();
    }

    let err = MarginedVolumeSequence::load(
        &tmp.0,
        "density",
        Some("emission"),
        GridLayout::uniform(2, 1),
        1.0,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        VolumeError::FrameCountMismatch {
            density: 5,
            emission: 4
        }
    ));
}

#[test]
fn test_empty_directory_has_no_frames() {
    let tmp = TempDir::new("empty");
    let err = MarginedVolumeSequence::load(&tmp.0, "density", None, GridLayout::default(), 1.0)
        .unwrap_err();
    assert!(matches!(err, VolumeError::NoFrames { .. }));
}

#[test]
fn test_corrupt_frame_aborts_load() {
    let tmp = TempDir::new("corrupt");
    let mut bytes = Vec::new();
    write_vol_to(&mut bytes, &constant_grid(UVec3::splat(2), 1.0)).unwrap();
    bytes.truncate(bytes.len() - 4);
    std::fs::write(tmp.0.join("density_0.vol"), bytes).unwrap();

    let err = MarginedVolumeSequence::load(&tmp.0, "density", None, GridLayout::uniform(2, 1), 1.0)
        .unwrap_err();
    assert!(matches!(err, VolumeError::Truncated { .. }));
}

#[test]
fn test_scene_config_file_round_trip() {
    let tmp = TempDir::new("config");
    let path = tmp.0.join("config.txt");
    std::fs::write(
        &path,
        "volumeFolder = fire\n\
         lightPos = 1 2 3\n\
         lightLe = 10 10 10\n\
         innerTexSize = 8\n\
         texMargin = 2\n",
    )
    .unwrap();

    let config = SceneConfig::load(&path).unwrap();
    assert_eq!(config.volume_folder, tmp.0.join("fire"));
    assert_eq!(config.light().position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(config.layout().margined(), UVec3::splat(12));

    let json_path = tmp.0.join("config.json");
    std::fs::write(&json_path, r#"{"volumeFolder": "/abs/fire", "texMargin": 0}"#).unwrap();
    let config = SceneConfig::load(&json_path).unwrap();
    assert_eq!(config.volume_folder, PathBuf::from("/abs/fire"));
    assert_eq!(config.layout().margined(), UVec3::splat(128));
}

#[test]
fn test_missing_config_file_is_unreadable() {
    let err = SceneConfig::load("/definitely/not/here/config.txt").unwrap_err();
    assert!(matches!(err, VolumeError::Unreadable { .. }));
}
