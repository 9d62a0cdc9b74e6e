use serde::Serialize;

use crate::model::task::{Task, TaskStatus};

/// One kanban column
#[derive(Debug)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

/// Tasks grouped into the three status columns
#[derive(Debug)]
pub struct Board<'a> {
    pub columns: Vec<Column<'a>>,
}

impl<'a> Board<'a> {
    pub fn column(&self, status: TaskStatus) -> &Column<'a> {
        // columns always hold every status, in `TaskStatus::ALL` order
        &self.columns[TaskStatus::ALL.iter().position(|s| *s == status).unwrap_or(0)]
    }

    /// Height of the tallest column
    pub fn depth(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).max().unwrap_or(0)
    }
}

/// Group tasks by status, keeping their relative order
pub fn group_by_status(tasks: &[Task]) -> Board<'_> {
    let columns = TaskStatus::ALL
        .iter()
        .map(|&status| Column {
            status,
            tasks: tasks.iter().filter(|t| t.status == status).collect(),
        })
        .collect();
    Board { columns }
}

/// Per-status counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::ToDo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Done => self.done += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.todo + self.in_progress + self.done
    }
}

pub fn count_by_status<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for task in tasks {
        counts.add(task.status);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            Task::new("1", "a"),
            Task::new("2", "b").with_status(TaskStatus::Done),
            Task::new("3", "c").with_status(TaskStatus::InProgress),
            Task::new("4", "d"),
        ]
    }

    #[test]
    fn groups_in_status_order() {
        let tasks = sample();
        let board = group_by_status(&tasks);
        let ids: Vec<Vec<&str>> = board
            .columns
            .iter()
            .map(|c| c.tasks.iter().map(|t| t.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["1", "4"], vec!["3"], vec!["2"]]);
        assert_eq!(board.column(TaskStatus::Done).tasks.len(), 1);
        assert_eq!(board.depth(), 2);
    }

    #[test]
    fn empty_board_has_all_columns() {
        let board = group_by_status(&[]);
        assert_eq!(board.columns.len(), 3);
        assert_eq!(board.depth(), 0);
    }

    #[test]
    fn counts() {
        let tasks = sample();
        let counts = count_by_status(&tasks);
        assert_eq!(
            counts,
            StatusCounts {
                todo: 2,
                in_progress: 1,
                done: 1
            }
        );
        assert_eq!(counts.total(), 4);
    }
}
