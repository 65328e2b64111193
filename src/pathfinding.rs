//! A* search over the 4-connected cell grid.
//!
//! Every step costs 1 and diagonal moves are not allowed, so Manhattan
//! distance is an admissible (and consistent) heuristic.

use crate::grid::Cell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Find a shortest path from `start` to `goal`.
///
/// `passable` decides which cells may be entered; `start` itself is never
/// checked. The returned path excludes `start` and ends with `goal`; it is
/// empty when `start == goal`. `None` means no route exists.
pub fn find_path(start: Cell, goal: Cell, mut passable: impl FnMut(Cell) -> bool) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(Vec::new());
    }

    // Heap entries are (f, g, insertion order, cell); the counter keeps ties
    // in discovery order so results are stable.
    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut best_cost: HashMap<Cell, u32> = HashMap::new();
    let mut counter = 0u32;

    best_cost.insert(start, 0);
    open.push(Reverse((start.manhattan(goal), 0u32, counter, (start.x, start.y))));

    while let Some(Reverse((_, cost, _, (x, y)))) = open.pop() {
        let current = Cell::new(x, y);
        if current == goal {
            return Some(reconstruct(&came_from, start, goal));
        }
        if best_cost.get(&current).is_some_and(|&best| cost > best) {
            continue;
        }

        for next in current.neighbours() {
            if !passable(next) {
                continue;
            }
            let next_cost = cost + 1;
            if best_cost.get(&next).map_or(true, |&best| next_cost < best) {
                best_cost.insert(next, next_cost);
                came_from.insert(next, current);
                counter += 1;
                open.push(Reverse((next_cost + next.manhattan(goal), next_cost, counter, (next.x, next.y))));
            }
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        if previous == start {
            break;
        }
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(size: i32) -> impl Fn(Cell) -> bool {
        move |c: Cell| c.x >= 0 && c.y >= 0 && c.x < size && c.y < size
    }

    #[test]
    fn test_open_grid_path_length() {
        let path = find_path(Cell::new(0, 0), Cell::new(4, 4), open_grid(5)).unwrap();
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&Cell::new(4, 4)));

        // Every step is orthogonally adjacent to the previous one.
        let mut previous = Cell::new(0, 0);
        for cell in path {
            assert_eq!(previous.manhattan(cell), 1);
            previous = cell;
        }
    }

    #[test]
    fn test_same_cell_is_empty_path() {
        let path = find_path(Cell::new(2, 2), Cell::new(2, 2), open_grid(5)).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_blocked_route_returns_none() {
        // A full wall at x = 2 separates the two halves.
        let passable = |c: Cell| c.x >= 0 && c.y >= 0 && c.x < 5 && c.y < 5 && c.x != 2;
        assert!(find_path(Cell::new(0, 0), Cell::new(4, 4), passable).is_none());
    }

    #[test]
    fn test_detours_around_wall() {
        // Wall at x = 2 with a gap at y = 4.
        let passable = |c: Cell| c.x >= 0 && c.y >= 0 && c.x < 5 && c.y < 5 && (c.x != 2 || c.y == 4);
        let path = find_path(Cell::new(0, 0), Cell::new(4, 0), passable).unwrap();
        assert_eq!(path.len(), 12);
        assert!(path.contains(&Cell::new(2, 4)));
    }

    #[test]
    fn test_impassable_goal() {
        let passable = |c: Cell| c != Cell::new(3, 3) && c.x >= 0 && c.y >= 0 && c.x < 5 && c.y < 5;
        assert!(find_path(Cell::new(0, 0), Cell::new(3, 3), passable).is_none());
    }
}
