//! Camera grid allocation
//!
//! ## Responsibilities
//!
//! - Assign up to 4 cameras into fixed slots by their declared position
//! - Rebuild deterministically on every camera list change
//!
//! Slots hold configuration copies only; lifecycle state lives in
//! `camera_lifecycle`.

use crate::models::Camera;

/// Number of fixed grid slots
pub const GRID_SLOTS: usize = 4;

/// Fixed-size camera grid. Rebuilt, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct GridSlots {
    slots: [Option<Camera>; GRID_SLOTS],
}

impl GridSlots {
    pub fn get(&self, slot: usize) -> Option<&Camera> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&Camera>)> {
        self.slots.iter().enumerate().map(|(i, s)| (i, s.as_ref()))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Allocate cameras into grid slots.
///
/// Takes at most the first 4 cameras in canonical list order and places each
/// at `slots[position]`. A position collision is last-write-wins; an
/// out-of-range position never occupies a slot. Both are warned, neither is
/// an error.
pub fn allocate(cameras: &[Camera]) -> GridSlots {
    let mut grid = GridSlots::default();

    if cameras.len() > GRID_SLOTS {
        tracing::debug!(
            total = cameras.len(),
            shown = GRID_SLOTS,
            "Cameras beyond the grid capacity are excluded from display"
        );
    }

    for camera in cameras.iter().take(GRID_SLOTS) {
        let position = camera.position;
        if !(0..GRID_SLOTS as i32).contains(&position) {
            tracing::warn!(
                camera_id = %camera.id,
                position = position,
                "Camera position outside the grid, leaving it unplaced"
            );
            continue;
        }

        let slot = position as usize;
        if let Some(previous) = &grid.slots[slot] {
            tracing::warn!(
                slot = slot,
                replaced = %previous.id,
                camera_id = %camera.id,
                "Grid position collision, later camera wins"
            );
        }
        grid.slots[slot] = Some(camera.clone());
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(id: &str, position: i32) -> Camera {
        Camera {
            id: id.to_string(),
            name: format!("Camera {}", id),
            kind: "rtsp".to_string(),
            url: format!("rtsp://10.0.0.1/{}", id),
            door_id: "door1".to_string(),
            fps: 15,
            enabled: true,
            position,
            created_at: None,
        }
    }

    #[test]
    fn test_positions_map_to_slots() {
        let grid = allocate(&[camera("c1", 0), camera("c2", 1)]);
        assert_eq!(grid.get(0).unwrap().id, "c1");
        assert_eq!(grid.get(1).unwrap().id, "c2");
        assert!(grid.get(2).is_none());
        assert!(grid.get(3).is_none());
    }

    #[test]
    fn test_order_independent_for_distinct_positions() {
        let a = allocate(&[camera("c1", 2), camera("c2", 0)]);
        let b = allocate(&[camera("c2", 0), camera("c1", 2)]);
        for slot in 0..GRID_SLOTS {
            assert_eq!(
                a.get(slot).map(|c| c.id.clone()),
                b.get(slot).map(|c| c.id.clone())
            );
        }
    }

    #[test]
    fn test_collision_last_write_wins() {
        let grid = allocate(&[camera("c1", 1), camera("c2", 1)]);
        assert_eq!(grid.get(1).unwrap().id, "c2");
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_fifth_camera_excluded() {
        let cameras = vec![
            camera("c1", 0),
            camera("c2", 1),
            camera("c3", 2),
            camera("c4", 3),
            camera("c5", 0),
        ];
        let grid = allocate(&cameras);
        assert_eq!(grid.get(0).unwrap().id, "c1");
        assert_eq!(grid.occupied_count(), 4);
    }

    #[test]
    fn test_out_of_range_position_unplaced() {
        let grid = allocate(&[camera("c1", 7), camera("c2", -1)]);
        assert_eq!(grid.occupied_count(), 0);
    }
}
