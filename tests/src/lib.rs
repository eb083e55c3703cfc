mod propagation;
